use crate::{entity::user, prelude::*};

pub struct User<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> User<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn create(
    &self,
    id: i64,
    email: &str,
    name: &str,
  ) -> Result<user::Model> {
    let email = email.trim();
    if !email.contains('@') {
      return Err(Error::InvalidArgs(format!("Invalid email: {email}")));
    }

    let user = user::ActiveModel {
      id: Set(id),
      email: Set(email.to_lowercase()),
      name: Set(name.trim().to_string()),
      reg_date: Set(Utc::now().naive_utc()),
    };

    Ok(user.insert(self.db).await?)
  }

  pub async fn by_id(&self, id: i64) -> Result<Option<user::Model>> {
    let user = user::Entity::find_by_id(id).one(self.db).await?;
    Ok(user)
  }
}
