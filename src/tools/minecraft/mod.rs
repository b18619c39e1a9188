pub mod tool_router;

#[cfg(test)]
pub(crate) mod testing;
