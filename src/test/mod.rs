mod config;
mod converter;
mod db;
mod frank;
mod period;

#[cfg(test)]
mod fixtures;
