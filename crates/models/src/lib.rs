pub mod errors;
pub mod db;
pub mod user;
pub mod user_credentials;
pub mod contact;
pub mod token;

#[cfg(test)]
mod tests;
