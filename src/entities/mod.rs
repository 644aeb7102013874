// Raw-material flow
pub mod batch_tracking;
pub mod hold_material;
pub mod rm_receiving;

// Packing area ledger
pub mod packing_location;
pub mod packing_transaction;

// Shop-floor collaborators
pub mod masterlist;
pub mod process_tag;
pub mod production_entry;

pub mod batch_sequence;
