pub mod token_gate;
