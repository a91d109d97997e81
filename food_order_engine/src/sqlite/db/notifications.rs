use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::db_types::{NewNotification, Notification};

pub async fn insert_notification(
    notification: &NewNotification,
    created_at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<i64, sqlx::Error> {
    let id = sqlx::query_scalar(
        "INSERT INTO notifications (user_id, message, created_at, is_read) VALUES ($1, $2, $3, FALSE) RETURNING id",
    )
    .bind(notification.user_id)
    .bind(&notification.message)
    .bind(created_at)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

pub async fn fetch_notifications_for_user(
    user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Notification>, sqlx::Error> {
    let notifications = sqlx::query_as("SELECT * FROM notifications WHERE user_id = $1 ORDER BY id")
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    Ok(notifications)
}

pub async fn count_notifications(conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM notifications").fetch_one(conn).await?;
    Ok(count)
}
