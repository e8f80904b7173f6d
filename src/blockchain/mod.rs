pub mod builder;
pub mod contract;
pub mod script;
pub mod traits;
pub mod tx;
pub mod utxo;
