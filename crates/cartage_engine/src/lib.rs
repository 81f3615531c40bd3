pub mod audit;
pub mod billing_admin;
pub mod connectivity;
pub mod creation;
pub mod lifecycle;
pub mod locks;
pub mod orchestrator;
pub mod pricing;
pub mod settlement;
pub mod store;

#[cfg(test)]
pub(crate) mod test_utils;
