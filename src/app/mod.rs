// BillExact - app/mod.rs
//
// Application layer: persistence of the billing book and export history,
// and wiring of validated config into core rule types.
// Dependencies: core, platform, util.

pub mod history;
pub mod options;
pub mod store;
