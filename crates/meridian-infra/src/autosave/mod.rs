//! Debounced auto-save pipeline for portal edit forms.

mod controller;

pub use controller::{
    AutosaveConfig, AutosaveController, AutosaveError, AutosaveHooks, SaveFuture, SaveState,
    SaveStatus,
};
