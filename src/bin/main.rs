//! Arcwallet CLI - offline key and transaction tooling
//!
//!   arcwallet generate                         → {"mnemonic": "..."}
//!   arcwallet address [options]                → {"address", "path", "public_key"}
//!   arcwallet sign --to <addr> --amount <n>    → {"tx_id", "signed", "fee", ...}
//!   arcwallet repl                             → drive the address state by hand
//!
//! Nothing here talks to the network. `sign` takes the suggested parameters
//! on the command line and prints the base64 envelope for any broadcaster.
//!
//! Output format:
//!   --json     Output raw JSON (default for non-tty)
//!   --pretty   Pretty-print JSON (default for tty)

use arcwallet::core::{DerivationPath, KeyContext, PathField};
use arcwallet::keys::{Bip32Ed25519, DerivationScheme, KeyMaterial, Seed};
use arcwallet::logging::init_logging;
use arcwallet::tx::{prepare, PaymentRequest, TransactionParams};
use arcwallet::wallet::{KeySnapshot, Recompute, WalletState};
use arcwallet::{generate_mnemonic, Address};
use base64::Engine;
use serde_json::{json, Value};
use std::env;
use std::io::{self, IsTerminal, Write};
use std::sync::Arc;
use tracing::debug;

fn main() {
    init_logging();

    let args: Vec<String> = env::args().collect();
    let opts = ParsedArgs::parse(&args[1..]);

    if opts.help {
        print_usage();
        return;
    }

    if opts.version {
        println!("arcwallet {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    let result = match opts.command.as_deref() {
        Some("generate") | Some("gen") => cmd_generate(),
        Some("address") | Some("addr") => cmd_address(&opts),
        Some("sign") => cmd_sign(&opts),
        Some("repl") => cmd_repl(&opts),
        Some(cmd) => Err(format!("Unknown command: {}", cmd)),
        None => {
            print_usage();
            return;
        }
    };

    let pretty = opts.pretty || (!opts.json && io::stdout().is_terminal());
    let render = |v: &Value| {
        let out = if pretty { serde_json::to_string_pretty(v) } else { serde_json::to_string(v) };
        out.unwrap_or_else(|_| v.to_string())
    };

    match result {
        Ok(output) => println!("{}", render(&output)),
        Err(e) => {
            eprintln!("{}", render(&json!({"error": e})));
            std::process::exit(1);
        }
    }
}

#[derive(Default)]
struct ParsedArgs {
    command: Option<String>,
    // Key options
    mnemonic: Option<String>,
    scheme: Option<String>,
    context: Option<String>,
    account: Option<String>,
    change: Option<String>,
    index: Option<String>,
    // Sign options
    to: Option<String>,
    from: Option<String>,
    amount: Option<String>,
    note: Option<String>,
    fee_per_byte: Option<String>,
    min_fee: Option<String>,
    first_valid: Option<String>,
    last_valid: Option<String>,
    genesis_id: Option<String>,
    genesis_hash: Option<String>,
    // Output options
    json: bool,
    pretty: bool,
    help: bool,
    version: bool,
}

impl ParsedArgs {
    fn parse(args: &[String]) -> Self {
        let mut opts = ParsedArgs::default();
        let mut positional = Vec::new();
        let mut i = 0;

        while i < args.len() {
            let arg = &args[i];
            let slot = match arg.as_str() {
                "--help" | "-h" => {
                    opts.help = true;
                    None
                }
                "--version" | "-V" => {
                    opts.version = true;
                    None
                }
                "--json" => {
                    opts.json = true;
                    None
                }
                "--pretty" => {
                    opts.pretty = true;
                    None
                }
                "--mnemonic" | "-m" => Some(&mut opts.mnemonic),
                "--scheme" => Some(&mut opts.scheme),
                "--context" | "-c" => Some(&mut opts.context),
                "--account" | "-a" => Some(&mut opts.account),
                "--change" => Some(&mut opts.change),
                "--index" | "-i" => Some(&mut opts.index),
                "--to" => Some(&mut opts.to),
                "--from" => Some(&mut opts.from),
                "--amount" => Some(&mut opts.amount),
                "--note" => Some(&mut opts.note),
                "--fee-per-byte" => Some(&mut opts.fee_per_byte),
                "--min-fee" => Some(&mut opts.min_fee),
                "--first-valid" => Some(&mut opts.first_valid),
                "--last-valid" => Some(&mut opts.last_valid),
                "--genesis-id" => Some(&mut opts.genesis_id),
                "--genesis-hash" => Some(&mut opts.genesis_hash),
                _ if !arg.starts_with('-') => {
                    positional.push(arg.clone());
                    None
                }
                _ => None, // Ignore unknown flags
            };
            if let Some(slot) = slot {
                if i + 1 < args.len() {
                    *slot = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            i += 1;
        }

        if !positional.is_empty() {
            opts.command = Some(positional.remove(0));
        }

        // Apply environment variables (lower priority than CLI args)
        let fallback = |slot: &mut Option<String>, key: &str| {
            if slot.is_none() {
                *slot = env::var(key).ok().filter(|s| !s.is_empty());
            }
        };
        fallback(&mut opts.mnemonic, "ARCWALLET_MNEMONIC");
        fallback(&mut opts.scheme, "ARCWALLET_SCHEME");
        fallback(&mut opts.genesis_id, "ARCWALLET_GENESIS_ID");
        fallback(&mut opts.genesis_hash, "ARCWALLET_GENESIS_HASH");

        opts
    }

    fn scheme(&self) -> Result<DerivationScheme, String> {
        match self.scheme.as_deref() {
            None => Ok(DerivationScheme::default()),
            Some(raw) => DerivationScheme::from_str(raw).ok_or_else(|| format!("Invalid scheme: {}", raw)),
        }
    }

    fn path(&self) -> Result<DerivationPath, String> {
        let context = match self.context.as_deref() {
            None => KeyContext::default(),
            Some(raw) => KeyContext::from_str(raw).ok_or_else(|| format!("Invalid context: {}", raw))?,
        };
        let component = |v: &Option<String>| arcwallet::core::parse_component(v.as_deref().unwrap_or("")).map_err(|e| e.to_string());
        Ok(DerivationPath::new(context, component(&self.account)?, component(&self.change)?, component(&self.index)?))
    }

    fn keys(&self) -> Result<Bip32Ed25519, String> {
        let phrase = self.mnemonic.as_deref().ok_or("Mnemonic required (--mnemonic or ARCWALLET_MNEMONIC)")?;
        let seed = Seed::from_phrase(phrase).map_err(|e| e.to_string())?;
        Bip32Ed25519::with_scheme(&seed, self.scheme()?).map_err(|e| e.to_string())
    }
}

fn required_u64(value: &Option<String>, flag: &str) -> Result<u64, String> {
    let raw = value.as_deref().ok_or_else(|| format!("{} required", flag))?;
    raw.parse().map_err(|_| format!("Invalid {}: {}", flag, raw))
}

fn optional_u64(value: &Option<String>, flag: &str, default: u64) -> Result<u64, String> {
    match value {
        Some(_) => required_u64(value, flag),
        None => Ok(default),
    }
}

fn print_usage() {
    println!(
        r#"arcwallet - ARC-52 wallet tooling

USAGE:
    arcwallet <command> [options]

COMMANDS:
    generate                Print a fresh 24-word mnemonic
    address                 Derive the address at a path
    sign                    Build and sign a payment (offline)
    repl                    Interactive address state

KEY OPTIONS:
    --mnemonic, -m <words>  24-word phrase (env: ARCWALLET_MNEMONIC)
    --scheme <name>         khovratovich|peikert (env: ARCWALLET_SCHEME)
    --context, -c <ctx>     address|identity (default: address)
    --account, -a <n>       Account index (default: 0)
    --change <n>            Change index (default: 0)
    --index, -i <n>         Key index (default: 0)

SIGN OPTIONS:
    --to <address>          Receiver (required)
    --amount <microalgos>   Amount (required)
    --note <text>           Note, UTF-8
    --from <address>        Rekeyed sender signed for by this key
    --fee-per-byte <n>      Suggested fee per byte (default: 0)
    --min-fee <n>           Minimum fee (default: 1000)
    --first-valid <round>   First valid round (required)
    --last-valid <round>    Last valid round (default: first + 1000)
    --genesis-id <id>       Genesis id (env: ARCWALLET_GENESIS_ID)
    --genesis-hash <b64>    Genesis hash, base64 (env: ARCWALLET_GENESIS_HASH)

OUTPUT OPTIONS:
    --json                  Raw JSON output
    --pretty                Pretty-print JSON
    --version, -V           Print version

ENVIRONMENT:
    RUST_LOG                Log filter (default: warn,arcwallet=info)
    ARCWALLET_LOG_FORMAT    pretty | compact | json (stderr)
    ARCWALLET_LOG_JSON=1    Same as ARCWALLET_LOG_FORMAT=json

EXAMPLES:
    arcwallet generate
    arcwallet address -m "abandon ... art" --account 1 --index 4
    arcwallet sign -m "..." --to LN26...3HIT5A --amount 100000 \
        --first-valid 1000 --genesis-id testnet-v1.0 --genesis-hash SGO1GKSzyE7IEPItTxCByw9x8FmnrCDexi9/cOUJOiI=
"#
    );
}

fn cmd_generate() -> Result<Value, String> {
    let mnemonic = generate_mnemonic().map_err(|e| e.to_string())?;
    Ok(json!({"mnemonic": mnemonic}))
}

fn cmd_address(opts: &ParsedArgs) -> Result<Value, String> {
    let keys = opts.keys()?;
    let path = opts.path()?;
    let public_key = keys.derive_public_key(&path).map_err(|e| e.to_string())?;
    Ok(json!({
        "address": public_key.to_address().to_string(),
        "path": path.to_string(),
        "public_key": public_key.to_hex(),
        "scheme": keys.scheme().as_str(),
    }))
}

fn cmd_sign(opts: &ParsedArgs) -> Result<Value, String> {
    let keys = opts.keys()?;
    let path = opts.path()?;

    let receiver: Address = opts.to.as_deref().ok_or("--to required")?.parse().map_err(|e| format!("Invalid --to: {}", e))?;
    let amount = required_u64(&opts.amount, "--amount")?;
    let first_valid = required_u64(&opts.first_valid, "--first-valid")?;
    let last_valid = optional_u64(&opts.last_valid, "--last-valid", first_valid.saturating_add(1000))?;
    let genesis_hash_raw = opts.genesis_hash.as_deref().ok_or("--genesis-hash required")?;
    let genesis_hash: [u8; 32] = base64::engine::general_purpose::STANDARD
        .decode(genesis_hash_raw)
        .map_err(|e| format!("Invalid --genesis-hash: {}", e))?
        .try_into()
        .map_err(|_| "Genesis hash must be 32 bytes".to_string())?;
    let params = TransactionParams {
        fee_per_byte: optional_u64(&opts.fee_per_byte, "--fee-per-byte", 0)?,
        min_fee: optional_u64(&opts.min_fee, "--min-fee", 1000)?,
        first_valid,
        last_valid,
        genesis_id: opts.genesis_id.clone().unwrap_or_default(),
        genesis_hash,
    };

    let mut request = PaymentRequest::new(receiver.to_string(), amount, opts.note.clone().unwrap_or_default().into_bytes());
    if let Some(from) = opts.from.as_deref() {
        request = request.from_sender(from.parse().map_err(|e| format!("Invalid --from: {}", e))?);
    }

    let snapshot = KeySnapshot { keys: Some(Arc::new(keys)), path };
    let prepared = prepare(&snapshot, &request, receiver, &params, &mut |stage| debug!(stage = stage.as_str(), "sign"))
        .map_err(|e| e.to_string())?;
    let envelope = &prepared.envelope;

    Ok(json!({
        "tx_id": prepared.tx_id,
        "signed": base64::engine::general_purpose::STANDARD.encode(&prepared.encoded),
        "sender": envelope.draft.sender.to_string(),
        "auth_addr": envelope.auth_addr.map(|a| a.to_string()),
        "fee": envelope.draft.fee,
        "path": path.to_string(),
    }))
}

fn describe(result: Result<Recompute, arcwallet::WalletError>) -> String {
    match result {
        Ok(Recompute::Derived { address, changed: true, .. }) => format!("address: {}", address),
        Ok(Recompute::Derived { changed: false, .. }) => "address unchanged".into(),
        Ok(Recompute::NoKey(path)) => format!("path {} (no key loaded)", path),
        Ok(Recompute::Incomplete(field)) => format!("fix {} first", field.as_str()),
        Ok(Recompute::Ignored) => "ignored".into(),
        Err(e) => format!("Error: {}", e),
    }
}

fn cmd_repl(opts: &ParsedArgs) -> Result<Value, String> {
    println!("Arcwallet REPL - type 'help' or 'quit'\n");

    let state = WalletState::new(opts.scheme()?, opts.path()?);
    state.subscribe(Box::new(|address: &Address| println!("  -> {}", address)));
    if let Some(phrase) = opts.mnemonic.as_deref() {
        println!("{}", describe(state.set_seed(phrase)));
    }

    loop {
        print!("arcwallet> ");
        io::stdout().flush().ok();

        let mut input = String::new();
        match io::stdin().read_line(&mut input) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }

        let input = input.trim_end_matches(['\r', '\n']);
        let (cmd, rest) = input.trim_start().split_once(' ').unwrap_or((input.trim(), ""));
        if cmd.is_empty() {
            continue;
        }

        match cmd {
            "quit" | "exit" | "q" => break,
            "help" | "?" => {
                println!("Commands:");
                println!("  seed <24 words>              - Load a mnemonic");
                println!("  context address|identity     - Switch key context");
                println!("  account|change|index <text>  - Edit a path field");
                println!("  show                         - Print path and address");
                println!("  quit                         - Exit");
            }
            "seed" => println!("{}", describe(state.set_seed(rest))),
            "context" => match KeyContext::from_str(rest.trim()) {
                Some(ctx) => println!("{}", describe(state.set_key_context(ctx))),
                None => println!("Usage: context address|identity"),
            },
            "account" | "change" | "index" => {
                let field = match cmd {
                    "account" => PathField::Account,
                    "change" => PathField::Change,
                    _ => PathField::KeyIndex,
                };
                println!("{}", describe(state.set_path_component(field, rest)));
                let text = state.field(field);
                println!("  {} = {:?}{}", field.as_str(), text.text, if text.invalid { " (invalid)" } else { "" });
            }
            "show" => {
                println!("path:    {}", state.path());
                println!("key:     {}", if state.has_key() { "loaded" } else { "none" });
                println!("address: {}", state.address_text());
            }
            other => println!("Unknown: {}. Type 'help'.", other),
        }
    }

    println!("Goodbye!");
    Ok(json!({"status": "exited", "address": state.address_text(), "path": state.path().to_string()}))
}
