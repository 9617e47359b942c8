pub(crate) mod state_cache;
