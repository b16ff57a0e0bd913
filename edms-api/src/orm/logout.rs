//! Session revocation.

use diesel::prelude::*;

use crate::orm::login::DbRunner;
use crate::schema::sessions::dsl::*;

/// Marks a session revoked. The row is kept; returns the number of rows
/// updated, which is 0 for an unknown token.
pub async fn revoke_session<D: DbRunner>(
    db: &D,
    session_id: &str,
) -> Result<usize, diesel::result::Error> {
    let session_id = session_id.to_string();
    db.run(move |conn| {
        diesel::update(sessions.filter(id.eq(&session_id)))
            .set(revoked.eq(true))
            .execute(conn)
    })
    .await
}
