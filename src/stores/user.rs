use email_address::EmailAddress;

use crate::{
    Error,
    models::{PasswordHash, User, UserID},
};

/// Handles the creation and retrieval of user accounts.
pub trait UserStore: Send + Sync {
    /// Create a new user with the given details.
    ///
    /// # Errors
    /// Returns [Error::DuplicateEmail] if a user with `email` already exists,
    /// or [Error::SqlError] for any other database error.
    fn create(
        &self,
        name: &str,
        email: EmailAddress,
        password_hash: PasswordHash,
    ) -> Result<User, Error>;

    /// Get the user with the given ID.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if there is no such user.
    fn get(&self, id: UserID) -> Result<User, Error>;

    /// Get the user registered with the given email address.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if there is no such user.
    fn get_by_email(&self, email: &EmailAddress) -> Result<User, Error>;

    /// Save changes to an existing user's name, email, and password hash.
    ///
    /// # Errors
    /// Returns [Error::DuplicateEmail] if the new email address belongs to
    /// another user, or [Error::NotFound] if the user no longer exists.
    fn update(&self, user: &User) -> Result<(), Error>;
}
