use diesel::prelude::*;

use crate::models::{NewUser, User, UserWithRoles};
use crate::orm::last_insert_rowid;
use crate::orm::user_role::get_user_roles;

/// Inserts a user and returns the stored row.
pub fn insert_user(
    conn: &mut SqliteConnection,
    new_username: &str,
    new_email: &str,
    new_password_hash: String,
    is_default_admin: bool,
) -> Result<User, diesel::result::Error> {
    use crate::schema::users::dsl::*;

    let insertable_user = NewUser {
        username: new_username.to_string(),
        email: new_email.to_string(),
        password_hash: new_password_hash,
        default_admin: is_default_admin,
    };

    diesel::insert_into(users).values(&insertable_user).execute(conn)?;
    let last_id = last_insert_rowid(conn)?;

    users.filter(id.eq(last_id)).select(User::as_select()).first(conn)
}

/// Returns all users in ascending order by id.
pub fn list_all_users(conn: &mut SqliteConnection) -> Result<Vec<User>, diesel::result::Error> {
    use crate::schema::users::dsl::*;
    users.order(id.asc()).select(User::as_select()).load(conn)
}

/// Returns every user with their roles, ordered by username.
pub fn list_users_with_roles(
    conn: &mut SqliteConnection,
) -> Result<Vec<UserWithRoles>, diesel::result::Error> {
    use crate::schema::users::dsl::*;

    let all = users.order(username.asc()).select(User::as_select()).load(conn)?;
    all.into_iter()
        .map(|user| {
            let roles = get_user_roles(conn, user.id)?;
            Ok(UserWithRoles::new(user, roles))
        })
        .collect()
}

pub fn get_user(
    conn: &mut SqliteConnection,
    user_id: i32,
) -> Result<Option<User>, diesel::result::Error> {
    use crate::schema::users::dsl::*;
    users.filter(id.eq(user_id)).select(User::as_select()).first(conn).optional()
}

pub fn get_user_by_username(
    conn: &mut SqliteConnection,
    name: &str,
) -> Result<Option<User>, diesel::result::Error> {
    use crate::schema::users::dsl::*;
    users
        .filter(username.eq(name))
        .select(User::as_select())
        .first(conn)
        .optional()
}

pub fn get_user_with_roles(
    conn: &mut SqliteConnection,
    user_id: i32,
) -> Result<Option<UserWithRoles>, diesel::result::Error> {
    let Some(user) = get_user(conn, user_id)? else {
        return Ok(None);
    };
    let roles = get_user_roles(conn, user.id)?;
    Ok(Some(UserWithRoles::new(user, roles)))
}

/// True when another account already uses `name` or `mail`.
pub fn username_or_email_taken(
    conn: &mut SqliteConnection,
    name: &str,
    mail: &str,
) -> Result<bool, diesel::result::Error> {
    use crate::schema::users::dsl::*;
    let count: i64 = users
        .filter(username.eq(name).or(email.eq(mail)))
        .count()
        .get_result(conn)?;
    Ok(count > 0)
}

/// Replaces a user's password hash. Returns the number of rows updated.
pub fn update_password_hash(
    conn: &mut SqliteConnection,
    user_id: i32,
    new_hash: String,
) -> Result<usize, diesel::result::Error> {
    use crate::schema::users::dsl::*;
    diesel::update(users.filter(id.eq(user_id)))
        .set(password_hash.eq(new_hash))
        .execute(conn)
}

/// Deletes a user. Sessions and role links go with it; inspections they
/// recorded keep the row alive through the foreign key, so deletion fails
/// for users with inspection history.
pub fn delete_user(conn: &mut SqliteConnection, user_id: i32) -> Result<usize, diesel::result::Error> {
    use crate::schema::users::dsl::*;
    diesel::delete(users.filter(id.eq(user_id))).execute(conn)
}

/// Number of inspections a user has recorded.
pub fn count_user_inspections(
    conn: &mut SqliteConnection,
    user_id: i32,
) -> Result<i64, diesel::result::Error> {
    use crate::schema::inspections;
    inspections::table
        .filter(inspections::user_id.eq(user_id))
        .count()
        .get_result(conn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orm::login::hash_password;
    use crate::orm::testing::setup_test_db;
    use crate::orm::user_role::assign_user_role_by_name;

    #[test]
    fn test_insert_and_get_user() {
        let mut conn = setup_test_db();
        let hash = hash_password("password1").unwrap();
        let user = insert_user(&mut conn, "inspector", "inspector@example.com", hash, false).unwrap();

        assert_eq!(user.username, "inspector");
        assert!(!user.default_admin);

        let fetched = get_user(&mut conn, user.id).unwrap().unwrap();
        assert_eq!(fetched.email, "inspector@example.com");
        let by_name = get_user_by_username(&mut conn, "inspector").unwrap().unwrap();
        assert_eq!(by_name.id, user.id);
        assert!(get_user(&mut conn, user.id + 100).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_username_is_rejected_by_database() {
        let mut conn = setup_test_db();
        insert_user(&mut conn, "dup", "one@example.com", "h".to_string(), false).unwrap();
        assert!(insert_user(&mut conn, "dup", "two@example.com", "h".to_string(), false).is_err());
        assert!(username_or_email_taken(&mut conn, "dup", "x@example.com").unwrap());
        assert!(username_or_email_taken(&mut conn, "other", "one@example.com").unwrap());
        assert!(!username_or_email_taken(&mut conn, "other", "x@example.com").unwrap());
    }

    #[test]
    fn test_users_with_roles_never_expose_hash() {
        let mut conn = setup_test_db();
        let user = insert_user(&mut conn, "boss", "boss@example.com", "h".to_string(), true).unwrap();
        assign_user_role_by_name(&mut conn, user.id, "admin").unwrap();

        let listed = list_users_with_roles(&mut conn).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].roles[0].name, "admin");

        let json = serde_json::to_value(&listed[0]).unwrap();
        assert!(json.get("password_hash").is_none());
    }

    #[test]
    fn test_update_password_and_delete() {
        let mut conn = setup_test_db();
        let user = insert_user(&mut conn, "temp", "temp@example.com", "old".to_string(), false).unwrap();

        assert_eq!(update_password_hash(&mut conn, user.id, "new".to_string()).unwrap(), 1);
        assert_eq!(get_user(&mut conn, user.id).unwrap().unwrap().password_hash, "new");

        assert_eq!(delete_user(&mut conn, user.id).unwrap(), 1);
        assert_eq!(delete_user(&mut conn, user.id).unwrap(), 0);
        assert!(list_all_users(&mut conn).unwrap().is_empty());
    }
}
