//! v002 -- Lookup indexes for the authorization queries.

use rusqlite::Connection;

const UP_SQL: &str = r#"
CREATE INDEX IF NOT EXISTS idx_servers_owner         ON servers(owner_id);
CREATE INDEX IF NOT EXISTS idx_subscriptions_user    ON subscriptions(user_id);
CREATE INDEX IF NOT EXISTS idx_roles_server          ON roles(server_id);
CREATE INDEX IF NOT EXISTS idx_role_subs_server_user ON role_subs(server_id, user_id);
CREATE INDEX IF NOT EXISTS idx_role_subs_role        ON role_subs(role_id);
CREATE INDEX IF NOT EXISTS idx_channels_server       ON channels(server_id);
CREATE INDEX IF NOT EXISTS idx_channel_roles_role    ON channel_roles(role_id);
"#;

pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
