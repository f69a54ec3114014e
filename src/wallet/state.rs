//! WalletState - single-writer state for the foreground domain.
//!
//! Path edits arrive one keystroke at a time. Each edit normalizes its own
//! field and writes the canonical text back to the view, and a view may echo
//! that write straight back in as another edit. `is_programmatic_change` is
//! held for the whole recompute, so the echo is dropped instead of recursing.
//!
//! ```text
//! set_path_component(field, text, caret)
//!     │
//!     ├── guard held? ──yes──► Recompute::Ignored
//!     │
//!     ├── enter guard
//!     ├── normalize field, clamp caret, write back ──► FieldWriter (may re-enter)
//!     ├── read + normalize the other two fields
//!     ├── assemble DerivationPath
//!     ├── key loaded? derive address, notify observers if it changed
//!     └── leave guard (on every exit path)
//! ```
//!
//! The type is `!Sync`. It lives on one thread; submissions read it through
//! [`WalletState::snapshot`].

use crate::core::{normalize_component, parse_component, Address, DerivationPath, KeyContext, PathField};
use crate::error::WalletResult;
use crate::keys::{Bip32Ed25519, DerivationScheme, KeyMaterial, Seed};
use crate::wallet::deriver::derive_address;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

/// Called with each newly displayed address.
pub type AddressObserver = Box<dyn Fn(&Address)>;

/// The view side of the path text fields.
pub trait FieldWriter {
    fn write_field(&self, field: PathField, text: &str, caret: usize);
}

/// Text of one numeric input as the state last saw it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldText {
    pub text: String,
    pub caret: usize,
    pub invalid: bool,
}

/// Outcome of one seed or path event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recompute {
    /// Dropped: a recompute was already in flight.
    Ignored,
    /// Another field still holds malformed text; the path was not rebuilt.
    Incomplete(PathField),
    /// Path rebuilt, but there is no key to derive from.
    NoKey(DerivationPath),
    /// Address derived for the path. `changed` is true when observers fired.
    Derived { path: DerivationPath, address: Address, changed: bool },
}

/// Key material and path captured together for a submission.
#[derive(Clone)]
pub struct KeySnapshot {
    pub keys: Option<Arc<dyn KeyMaterial>>,
    pub path: DerivationPath,
}

/// Holds the guard for the lifetime of one recompute.
struct ProgrammaticChange<'a>(&'a Cell<bool>);

impl<'a> ProgrammaticChange<'a> {
    fn enter(flag: &'a Cell<bool>) -> Option<Self> {
        if flag.replace(true) {
            return None;
        }
        Some(Self(flag))
    }
}

impl Drop for ProgrammaticChange<'_> {
    fn drop(&mut self) { self.0.set(false) }
}

fn slot(field: PathField) -> usize {
    match field {
        PathField::Account => 0,
        PathField::Change => 1,
        PathField::KeyIndex => 2,
    }
}

pub struct WalletState {
    scheme: DerivationScheme,
    keys: RefCell<Option<Arc<dyn KeyMaterial>>>,
    context: Cell<KeyContext>,
    fields: RefCell<[FieldText; 3]>,
    path: Cell<DerivationPath>,
    address: RefCell<Option<Address>>,
    is_programmatic_change: Cell<bool>,
    observers: RefCell<Vec<Rc<dyn Fn(&Address)>>>,
    writer: RefCell<Option<Rc<dyn FieldWriter>>>,
}

impl Default for WalletState {
    fn default() -> Self { Self::new(DerivationScheme::default(), DerivationPath::default()) }
}

impl WalletState {
    pub fn new(scheme: DerivationScheme, initial: DerivationPath) -> Self {
        let text = |v: u32| FieldText { text: v.to_string(), caret: v.to_string().len(), invalid: false };
        Self {
            scheme,
            keys: RefCell::new(None),
            context: Cell::new(initial.context),
            fields: RefCell::new([text(initial.account), text(initial.change), text(initial.key_index)]),
            path: Cell::new(initial),
            address: RefCell::new(None),
            is_programmatic_change: Cell::new(false),
            observers: RefCell::new(Vec::new()),
            writer: RefCell::new(None),
        }
    }

    /// Register an address observer. One added during a notification is
    /// first called on the next change.
    pub fn subscribe(&self, observer: AddressObserver) { self.observers.borrow_mut().push(Rc::from(observer)); }

    /// Attach the view that receives normalized field text.
    pub fn attach_writer(&self, writer: Box<dyn FieldWriter>) { *self.writer.borrow_mut() = Some(Rc::from(writer)); }

    pub fn detach_writer(&self) { self.writer.borrow_mut().take(); }

    pub fn address(&self) -> Option<Address> { *self.address.borrow() }

    /// Displayed address, empty before the first derivation.
    pub fn address_text(&self) -> String { self.address().map(|a| a.to_string()).unwrap_or_default() }

    pub fn path(&self) -> DerivationPath { self.path.get() }

    pub fn key_context(&self) -> KeyContext { self.context.get() }

    pub fn field(&self, field: PathField) -> FieldText { self.fields.borrow()[slot(field)].clone() }

    pub fn has_key(&self) -> bool { self.keys.borrow().is_some() }

    pub fn is_recomputing(&self) -> bool { self.is_programmatic_change.get() }

    pub fn snapshot(&self) -> KeySnapshot {
        KeySnapshot { keys: self.keys.borrow().clone(), path: self.path.get() }
    }

    /// Validate a recovery phrase and rebuild key material from it.
    ///
    /// An invalid phrase drops the current key and leaves the displayed
    /// address untouched.
    pub fn set_seed(&self, phrase: &str) -> WalletResult<Recompute> {
        let seed = match Seed::from_phrase(phrase) {
            Ok(seed) => seed,
            Err(e) => {
                tracing::debug!(error = %e, "mnemonic rejected, no key");
                self.keys.borrow_mut().take();
                return Err(e.into());
            }
        };
        let keys = Bip32Ed25519::with_scheme(&seed, self.scheme)?;
        self.set_key_material(Arc::new(keys))
    }

    /// Install key material from any backend and recompute.
    ///
    /// Dropped without touching the current key when a recompute is in flight.
    pub fn set_key_material(&self, keys: Arc<dyn KeyMaterial>) -> WalletResult<Recompute> {
        let Some(_guard) = ProgrammaticChange::enter(&self.is_programmatic_change) else {
            tracing::trace!("re-entrant key change ignored");
            return Ok(Recompute::Ignored);
        };
        *self.keys.borrow_mut() = Some(keys);
        self.recompute(None)
    }

    pub fn clear_key_material(&self) { self.keys.borrow_mut().take(); }

    pub fn set_key_context(&self, context: KeyContext) -> WalletResult<Recompute> {
        let Some(_guard) = ProgrammaticChange::enter(&self.is_programmatic_change) else {
            tracing::trace!("re-entrant context change ignored");
            return Ok(Recompute::Ignored);
        };
        let previous = self.context.replace(context);
        let result = self.recompute(None);
        if result.is_err() {
            self.context.set(previous);
        }
        result
    }

    /// Edit with the caret at the end of `text`.
    pub fn set_path_component(&self, field: PathField, text: &str) -> WalletResult<Recompute> {
        self.set_path_component_at(field, text, text.len())
    }

    /// Edit one numeric field. `caret` is where the view's cursor sat in
    /// `text`; it is clamped to the normalized length on write-back.
    pub fn set_path_component_at(&self, field: PathField, text: &str, caret: usize) -> WalletResult<Recompute> {
        let Some(_guard) = ProgrammaticChange::enter(&self.is_programmatic_change) else {
            tracing::trace!(field = field.as_str(), "re-entrant edit ignored");
            return Ok(Recompute::Ignored);
        };

        let normalized = match normalize_component(text) {
            Ok(n) => n,
            Err(e) => {
                self.fields.borrow_mut()[slot(field)] =
                    FieldText { text: text.to_string(), caret: caret.min(text.len()), invalid: true };
                return Err(e.into());
            }
        };
        let caret = caret.min(normalized.len());
        self.fields.borrow_mut()[slot(field)] = FieldText { text: normalized.clone(), caret, invalid: false };

        let writer = self.writer.borrow().clone();
        if let Some(writer) = writer {
            writer.write_field(field, &normalized, caret);
        }

        self.recompute(Some(field))
    }

    /// Body of the protocol. The caller holds the guard.
    fn recompute(&self, trigger: Option<PathField>) -> WalletResult<Recompute> {
        let mut values = [0u32; 3];
        for field in PathField::ALL {
            let text = self.field(field);
            if text.invalid {
                return Ok(Recompute::Incomplete(field));
            }
            values[slot(field)] = parse_component(&text.text)?;
        }
        let path = DerivationPath::new(self.context.get(), values[0], values[1], values[2]);

        let Some(keys) = self.keys.borrow().clone() else {
            self.path.set(path);
            tracing::debug!(%path, "no key material, address kept");
            return Ok(Recompute::NoKey(path));
        };

        // path and address move together or not at all
        let address = derive_address(keys.as_ref(), &path)?;
        self.path.set(path);
        let changed = self.address() != Some(address);
        if changed {
            *self.address.borrow_mut() = Some(address);
            tracing::debug!(%path, %address, trigger = trigger.map(|f| f.as_str()), "address recomputed");
            let observers = self.observers.borrow().clone();
            for observer in &observers {
                observer(&address);
            }
        }
        Ok(Recompute::Derived { path, address, changed })
    }
}
