pub mod reconcile_api;
