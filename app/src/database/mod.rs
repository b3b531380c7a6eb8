pub mod connect;

#[cfg(test)]
pub(crate) mod testing;
