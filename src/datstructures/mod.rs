pub mod scope_chain;
