use redis::aio::ConnectionManager;
use tracing::debug;

use crate::common::{DatabaseError, DatabaseResult};

/// Readiness probe: `PING` must answer `PONG`.
pub async fn check_health(conn: &mut ConnectionManager) -> DatabaseResult<()> {
    let reply: String = redis::cmd("PING")
        .query_async(conn)
        .await
        .map_err(|e| DatabaseError::unhealthy("redis", e))?;

    if reply != "PONG" {
        return Err(DatabaseError::unhealthy(
            "redis",
            format!("unexpected PING reply {reply}"),
        ));
    }

    debug!("redis health check passed");
    Ok(())
}
