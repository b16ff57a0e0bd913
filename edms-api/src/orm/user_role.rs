use diesel::prelude::*;

use crate::models::{NewUserRole, Role};

/// Gives a user a role.
pub fn assign_user_role(
    conn: &mut SqliteConnection,
    user_id_param: i32,
    role_id_param: i32,
) -> Result<(), diesel::result::Error> {
    use crate::schema::user_roles::dsl::*;

    diesel::insert_into(user_roles)
        .values(&NewUserRole { user_id: user_id_param, role_id: role_id_param })
        .execute(conn)?;
    Ok(())
}

/// Assigns a role by name, failing with `NotFound` if the role is unknown.
pub fn assign_user_role_by_name(
    conn: &mut SqliteConnection,
    user_id_param: i32,
    role_name: &str,
) -> Result<(), diesel::result::Error> {
    let role = crate::orm::role::get_role_by_name(conn, role_name)?
        .ok_or(diesel::result::Error::NotFound)?;
    assign_user_role(conn, user_id_param, role.id)
}

/// Gets all roles held by a user.
pub fn get_user_roles(
    conn: &mut SqliteConnection,
    user_id_param: i32,
) -> Result<Vec<Role>, diesel::result::Error> {
    use crate::schema::{roles, user_roles};

    roles::table
        .inner_join(user_roles::table)
        .filter(user_roles::user_id.eq(user_id_param))
        .order(roles::id.asc())
        .select(Role::as_select())
        .load(conn)
}

/// Checks whether a user holds the named role.
pub fn user_has_role(
    conn: &mut SqliteConnection,
    user_id_param: i32,
    role_name: &str,
) -> Result<bool, diesel::result::Error> {
    use crate::schema::{roles, user_roles};

    let count: i64 = roles::table
        .inner_join(user_roles::table)
        .filter(user_roles::user_id.eq(user_id_param))
        .filter(roles::name.eq(role_name))
        .count()
        .get_result(conn)?;
    Ok(count > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orm::login::hash_password;
    use crate::orm::testing::setup_test_db;
    use crate::orm::user::insert_user;

    #[test]
    fn test_assign_and_check_roles() {
        let mut conn = setup_test_db();
        let user = insert_user(
            &mut conn,
            "inspector",
            "inspector@example.com",
            hash_password("password1").unwrap(),
            false,
        )
        .unwrap();

        assert!(!user_has_role(&mut conn, user.id, "user").unwrap());

        assign_user_role_by_name(&mut conn, user.id, "user").unwrap();
        assert!(user_has_role(&mut conn, user.id, "user").unwrap());
        assert!(!user_has_role(&mut conn, user.id, "admin").unwrap());

        let held = get_user_roles(&mut conn, user.id).unwrap();
        assert_eq!(held.len(), 1);
        assert_eq!(held[0].name, "user");
    }

    #[test]
    fn test_assign_unknown_role_is_not_found() {
        let mut conn = setup_test_db();
        let user = insert_user(&mut conn, "someone", "s@example.com", "x".to_string(), false).unwrap();
        let result = assign_user_role_by_name(&mut conn, user.id, "superuser");
        assert!(matches!(result, Err(diesel::result::Error::NotFound)));
    }
}
