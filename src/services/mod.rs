pub mod retry;
pub mod gateways;
pub mod quantizer;
pub mod sizing;
pub mod bracket;
pub mod orchestrator;

#[cfg(test)]
mod gateways_tests;
#[cfg(test)]
pub(crate) mod test_support;
