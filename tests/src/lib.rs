#[cfg(test)]
mod cycle;
