//! Upserts and reads for synced analytics rows.
//!
//! Every upsert conflicts on the table's natural key, so writing the same
//! record twice leaves one row holding the latest values.

use chrono::NaiveDate;
use sqlx::types::Json;
use studio_connectors::records::{
    BusinessReview, Ga4DailyMetrics, Ga4RealtimeSnapshot, Ga4TrafficSource, GtmContainer,
    GtmItem, GtmItemKind, SearchDimension, SearchPerformance, SyncRecord, YoutubeDailyStats,
};
use uuid::Uuid;

use crate::db::models::{
    Ga4DailyRow, Ga4RealtimeRow, Ga4TrafficRow, GtmContainerRow, GtmItemRow, ReviewRow,
    SearchRow, YoutubeDailyRow,
};
use crate::db::DbPool;
use crate::error::AppResult;

/// Stores one record under its natural key.
pub async fn upsert_record(pool: &DbPool, property_id: Uuid, record: &SyncRecord) -> AppResult<()> {
    match record {
        SyncRecord::Ga4Daily(m) => upsert_ga4_daily(pool, property_id, m).await,
        SyncRecord::Ga4TrafficSource(t) => upsert_ga4_traffic(pool, property_id, t).await,
        SyncRecord::Ga4Realtime(s) => insert_ga4_realtime(pool, property_id, s).await,
        SyncRecord::SearchPerformance(p) => upsert_search(pool, property_id, p).await,
        SyncRecord::GtmContainer(c) => upsert_gtm_container(pool, property_id, c).await,
        SyncRecord::GtmItem(item) => upsert_gtm_item(pool, property_id, item).await,
        SyncRecord::BusinessReview(r) => upsert_review(pool, property_id, r).await,
        SyncRecord::YoutubeDaily(s) => upsert_youtube_daily(pool, property_id, s).await,
    }
}

// GA4

pub async fn upsert_ga4_daily(pool: &DbPool, property_id: Uuid, m: &Ga4DailyMetrics) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO cms.ga4_daily_metrics (
            property_id, date, active_users, new_users, sessions, bounce_rate, engagement_rate,
            average_session_duration, screen_page_views, screen_page_views_per_session,
            event_count, conversions, total_revenue
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        ON CONFLICT (property_id, date) DO UPDATE SET
            active_users = EXCLUDED.active_users,
            new_users = EXCLUDED.new_users,
            sessions = EXCLUDED.sessions,
            bounce_rate = EXCLUDED.bounce_rate,
            engagement_rate = EXCLUDED.engagement_rate,
            average_session_duration = EXCLUDED.average_session_duration,
            screen_page_views = EXCLUDED.screen_page_views,
            screen_page_views_per_session = EXCLUDED.screen_page_views_per_session,
            event_count = EXCLUDED.event_count,
            conversions = EXCLUDED.conversions,
            total_revenue = EXCLUDED.total_revenue,
            updated_at = NOW()
        "#,
    )
    .bind(property_id)
    .bind(m.date)
    .bind(m.active_users)
    .bind(m.new_users)
    .bind(m.sessions)
    .bind(m.bounce_rate)
    .bind(m.engagement_rate)
    .bind(m.average_session_duration)
    .bind(m.screen_page_views)
    .bind(m.screen_page_views_per_session)
    .bind(m.event_count)
    .bind(m.conversions)
    .bind(m.total_revenue)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn upsert_ga4_traffic(pool: &DbPool, property_id: Uuid, t: &Ga4TrafficSource) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO cms.ga4_traffic_source (
            property_id, date, source_medium, source, medium, campaign, active_users,
            new_users, sessions, bounce_rate, engagement_rate, conversions, total_revenue
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        ON CONFLICT (property_id, date, source_medium) DO UPDATE SET
            source = EXCLUDED.source,
            medium = EXCLUDED.medium,
            campaign = EXCLUDED.campaign,
            active_users = EXCLUDED.active_users,
            new_users = EXCLUDED.new_users,
            sessions = EXCLUDED.sessions,
            bounce_rate = EXCLUDED.bounce_rate,
            engagement_rate = EXCLUDED.engagement_rate,
            conversions = EXCLUDED.conversions,
            total_revenue = EXCLUDED.total_revenue,
            updated_at = NOW()
        "#,
    )
    .bind(property_id)
    .bind(t.date)
    .bind(&t.source_medium)
    .bind(&t.source)
    .bind(&t.medium)
    .bind(&t.campaign)
    .bind(t.active_users)
    .bind(t.new_users)
    .bind(t.sessions)
    .bind(t.bounce_rate)
    .bind(t.engagement_rate)
    .bind(t.conversions)
    .bind(t.total_revenue)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn insert_ga4_realtime(
    pool: &DbPool,
    property_id: Uuid,
    s: &Ga4RealtimeSnapshot,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO cms.ga4_realtime_snapshot (
            property_id, captured_at, active_users, screen_page_views, event_count,
            top_pages, top_sources, top_countries, top_devices
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(property_id)
    .bind(s.captured_at)
    .bind(s.active_users)
    .bind(s.screen_page_views)
    .bind(s.event_count)
    .bind(Json(&s.top_pages))
    .bind(Json(&s.top_sources))
    .bind(Json(&s.top_countries))
    .bind(Json(&s.top_devices))
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn list_ga4_daily(
    pool: &DbPool,
    property_id: Uuid,
    start: NaiveDate,
    end: NaiveDate,
) -> AppResult<Vec<Ga4DailyRow>> {
    let rows = sqlx::query_as::<_, Ga4DailyRow>(
        r#"
        SELECT date, active_users, new_users, sessions, bounce_rate, engagement_rate,
               average_session_duration, screen_page_views, screen_page_views_per_session,
               event_count, conversions, total_revenue
        FROM cms.ga4_daily_metrics
        WHERE property_id = $1 AND date BETWEEN $2 AND $3
        ORDER BY date ASC
        "#,
    )
    .bind(property_id)
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

pub async fn list_ga4_traffic(
    pool: &DbPool,
    property_id: Uuid,
    start: NaiveDate,
    end: NaiveDate,
) -> AppResult<Vec<Ga4TrafficRow>> {
    let rows = sqlx::query_as::<_, Ga4TrafficRow>(
        r#"
        SELECT date, source_medium, source, medium, campaign, active_users, new_users,
               sessions, bounce_rate, engagement_rate, conversions, total_revenue
        FROM cms.ga4_traffic_source
        WHERE property_id = $1 AND date BETWEEN $2 AND $3
        ORDER BY date ASC, sessions DESC
        "#,
    )
    .bind(property_id)
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

pub async fn latest_ga4_realtime(pool: &DbPool, property_id: Uuid) -> AppResult<Option<Ga4RealtimeRow>> {
    let row = sqlx::query_as::<_, Ga4RealtimeRow>(
        r#"
        SELECT captured_at, active_users, screen_page_views, event_count,
               top_pages, top_sources, top_countries, top_devices
        FROM cms.ga4_realtime_snapshot
        WHERE property_id = $1
        ORDER BY captured_at DESC
        LIMIT 1
        "#,
    )
    .bind(property_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

// Search Console

pub async fn upsert_search(pool: &DbPool, property_id: Uuid, p: &SearchPerformance) -> AppResult<()> {
    let query = match &p.dimension {
        SearchDimension::Total => bind_search(
            sqlx::query(
                r#"
                INSERT INTO cms.gsc_performance (property_id, date, clicks, impressions, ctr, position)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (property_id, date) DO UPDATE SET
                    clicks = EXCLUDED.clicks,
                    impressions = EXCLUDED.impressions,
                    ctr = EXCLUDED.ctr,
                    position = EXCLUDED.position,
                    updated_at = NOW()
                "#,
            ),
            property_id,
            p,
        ),
        SearchDimension::Query(q) => bind_search(
            sqlx::query(
                r#"
                INSERT INTO cms.gsc_query_daily (property_id, date, clicks, impressions, ctr, position, query)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ON CONFLICT (property_id, date, query) DO UPDATE SET
                    clicks = EXCLUDED.clicks,
                    impressions = EXCLUDED.impressions,
                    ctr = EXCLUDED.ctr,
                    position = EXCLUDED.position,
                    updated_at = NOW()
                "#,
            ),
            property_id,
            p,
        )
        .bind(q),
        SearchDimension::Page(page) => bind_search(
            sqlx::query(
                r#"
                INSERT INTO cms.gsc_page_daily (property_id, date, clicks, impressions, ctr, position, page)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ON CONFLICT (property_id, date, page) DO UPDATE SET
                    clicks = EXCLUDED.clicks,
                    impressions = EXCLUDED.impressions,
                    ctr = EXCLUDED.ctr,
                    position = EXCLUDED.position,
                    updated_at = NOW()
                "#,
            ),
            property_id,
            p,
        )
        .bind(page),
    };

    query.execute(pool).await?;

    Ok(())
}

type PgQuery<'q> = sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>;

/// Binds `$1..$6`, the columns all three search tables share.
fn bind_search<'q>(query: PgQuery<'q>, property_id: Uuid, p: &SearchPerformance) -> PgQuery<'q> {
    query
        .bind(property_id)
        .bind(p.date)
        .bind(p.clicks)
        .bind(p.impressions)
        .bind(p.ctr)
        .bind(p.position)
}

pub async fn list_search(
    pool: &DbPool,
    property_id: Uuid,
    start: NaiveDate,
    end: NaiveDate,
) -> AppResult<Vec<SearchRow>> {
    let rows = sqlx::query_as::<_, SearchRow>(
        r#"
        SELECT date, 'total'::TEXT AS dimension, ''::TEXT AS value, clicks, impressions, ctr, position
        FROM cms.gsc_performance
        WHERE property_id = $1 AND date BETWEEN $2 AND $3
        UNION ALL
        SELECT date, 'query'::TEXT, query, clicks, impressions, ctr, position
        FROM cms.gsc_query_daily
        WHERE property_id = $1 AND date BETWEEN $2 AND $3
        UNION ALL
        SELECT date, 'page'::TEXT, page, clicks, impressions, ctr, position
        FROM cms.gsc_page_daily
        WHERE property_id = $1 AND date BETWEEN $2 AND $3
        ORDER BY date ASC, dimension DESC, clicks DESC
        "#,
    )
    .bind(property_id)
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

// Tag Manager

pub async fn upsert_gtm_container(
    pool: &DbPool,
    property_id: Uuid,
    c: &GtmContainer,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO cms.gtm_container (
            property_id, container_id, name, public_id, usage_context, domain_name, notes
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (property_id, container_id) DO UPDATE SET
            name = EXCLUDED.name,
            public_id = EXCLUDED.public_id,
            usage_context = EXCLUDED.usage_context,
            domain_name = EXCLUDED.domain_name,
            notes = EXCLUDED.notes,
            updated_at = NOW()
        "#,
    )
    .bind(property_id)
    .bind(&c.container_id)
    .bind(&c.name)
    .bind(&c.public_id)
    .bind(&c.usage_context)
    .bind(&c.domain_name)
    .bind(&c.notes)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn upsert_gtm_item(pool: &DbPool, property_id: Uuid, item: &GtmItem) -> AppResult<()> {
    match item.kind {
        GtmItemKind::Tag => {
            sqlx::query(
                r#"
                INSERT INTO cms.gtm_tag (
                    property_id, container_id, tag_id, name, tag_type,
                    firing_trigger_ids, paused, notes, parameter
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                ON CONFLICT (property_id, container_id, tag_id) DO UPDATE SET
                    name = EXCLUDED.name,
                    tag_type = EXCLUDED.tag_type,
                    firing_trigger_ids = EXCLUDED.firing_trigger_ids,
                    paused = EXCLUDED.paused,
                    notes = EXCLUDED.notes,
                    parameter = EXCLUDED.parameter,
                    updated_at = NOW()
                "#,
            )
            .bind(property_id)
            .bind(&item.container_id)
            .bind(&item.item_id)
            .bind(&item.name)
            .bind(&item.item_type)
            .bind(&item.firing_trigger_ids)
            .bind(item.paused)
            .bind(&item.notes)
            .bind(&item.config)
            .execute(pool)
            .await?;
        }
        GtmItemKind::Trigger => {
            sqlx::query(
                r#"
                INSERT INTO cms.gtm_trigger (
                    property_id, container_id, trigger_id, name, trigger_type, notes, filter
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ON CONFLICT (property_id, container_id, trigger_id) DO UPDATE SET
                    name = EXCLUDED.name,
                    trigger_type = EXCLUDED.trigger_type,
                    notes = EXCLUDED.notes,
                    filter = EXCLUDED.filter,
                    updated_at = NOW()
                "#,
            )
            .bind(property_id)
            .bind(&item.container_id)
            .bind(&item.item_id)
            .bind(&item.name)
            .bind(&item.item_type)
            .bind(&item.notes)
            .bind(&item.config)
            .execute(pool)
            .await?;
        }
        GtmItemKind::Variable => {
            sqlx::query(
                r#"
                INSERT INTO cms.gtm_variable (
                    property_id, container_id, variable_id, name, variable_type, notes, parameter
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ON CONFLICT (property_id, container_id, variable_id) DO UPDATE SET
                    name = EXCLUDED.name,
                    variable_type = EXCLUDED.variable_type,
                    notes = EXCLUDED.notes,
                    parameter = EXCLUDED.parameter,
                    updated_at = NOW()
                "#,
            )
            .bind(property_id)
            .bind(&item.container_id)
            .bind(&item.item_id)
            .bind(&item.name)
            .bind(&item.item_type)
            .bind(&item.notes)
            .bind(&item.config)
            .execute(pool)
            .await?;
        }
    }

    Ok(())
}

pub async fn list_gtm_containers(pool: &DbPool, property_id: Uuid) -> AppResult<Vec<GtmContainerRow>> {
    let rows = sqlx::query_as::<_, GtmContainerRow>(
        r#"
        SELECT container_id, name, public_id, usage_context, domain_name, notes, updated_at
        FROM cms.gtm_container
        WHERE property_id = $1
        ORDER BY name ASC
        "#,
    )
    .bind(property_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

pub async fn list_gtm_items(
    pool: &DbPool,
    property_id: Uuid,
    kind: GtmItemKind,
) -> AppResult<Vec<GtmItemRow>> {
    let sql = match kind {
        GtmItemKind::Tag => {
            r#"
            SELECT container_id, tag_id AS item_id, name, tag_type AS item_type,
                   firing_trigger_ids, paused, notes, parameter AS config
            FROM cms.gtm_tag
            WHERE property_id = $1
            ORDER BY container_id, name
            "#
        }
        GtmItemKind::Trigger => {
            r#"
            SELECT container_id, trigger_id AS item_id, name, trigger_type AS item_type,
                   ARRAY[]::TEXT[] AS firing_trigger_ids, FALSE AS paused, notes, filter AS config
            FROM cms.gtm_trigger
            WHERE property_id = $1
            ORDER BY container_id, name
            "#
        }
        GtmItemKind::Variable => {
            r#"
            SELECT container_id, variable_id AS item_id, name, variable_type AS item_type,
                   ARRAY[]::TEXT[] AS firing_trigger_ids, FALSE AS paused, notes, parameter AS config
            FROM cms.gtm_variable
            WHERE property_id = $1
            ORDER BY container_id, name
            "#
        }
    };

    let rows = sqlx::query_as::<_, GtmItemRow>(sql)
        .bind(property_id)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

// Business Profile

pub async fn upsert_review(pool: &DbPool, property_id: Uuid, r: &BusinessReview) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO cms.gbp_review (
            property_id, review_id, reviewer_name, reviewer_photo_url, star_rating, comment,
            create_time, update_time, reply_comment, reply_update_time
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        ON CONFLICT (property_id, review_id) DO UPDATE SET
            reviewer_name = EXCLUDED.reviewer_name,
            reviewer_photo_url = EXCLUDED.reviewer_photo_url,
            star_rating = EXCLUDED.star_rating,
            comment = EXCLUDED.comment,
            update_time = EXCLUDED.update_time,
            reply_comment = EXCLUDED.reply_comment,
            reply_update_time = EXCLUDED.reply_update_time
        "#,
    )
    .bind(property_id)
    .bind(&r.review_id)
    .bind(&r.reviewer_name)
    .bind(&r.reviewer_photo_url)
    .bind(r.star_rating)
    .bind(&r.comment)
    .bind(r.create_time)
    .bind(r.update_time)
    .bind(&r.reply_comment)
    .bind(r.reply_update_time)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn list_reviews(pool: &DbPool, property_id: Uuid) -> AppResult<Vec<ReviewRow>> {
    let rows = sqlx::query_as::<_, ReviewRow>(
        r#"
        SELECT review_id, reviewer_name, reviewer_photo_url, star_rating, comment,
               create_time, update_time, reply_comment, reply_update_time
        FROM cms.gbp_review
        WHERE property_id = $1
        ORDER BY create_time DESC
        "#,
    )
    .bind(property_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

// YouTube

pub async fn upsert_youtube_daily(
    pool: &DbPool,
    property_id: Uuid,
    s: &YoutubeDailyStats,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO cms.youtube_daily_stats (
            property_id, date, views, estimated_minutes_watched, average_view_duration,
            subscribers_gained, subscribers_lost, likes, dislikes, shares, comments
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        ON CONFLICT (property_id, date) DO UPDATE SET
            views = EXCLUDED.views,
            estimated_minutes_watched = EXCLUDED.estimated_minutes_watched,
            average_view_duration = EXCLUDED.average_view_duration,
            subscribers_gained = EXCLUDED.subscribers_gained,
            subscribers_lost = EXCLUDED.subscribers_lost,
            likes = EXCLUDED.likes,
            dislikes = EXCLUDED.dislikes,
            shares = EXCLUDED.shares,
            comments = EXCLUDED.comments,
            updated_at = NOW()
        "#,
    )
    .bind(property_id)
    .bind(s.date)
    .bind(s.views)
    .bind(s.estimated_minutes_watched)
    .bind(s.average_view_duration)
    .bind(s.subscribers_gained)
    .bind(s.subscribers_lost)
    .bind(s.likes)
    .bind(s.dislikes)
    .bind(s.shares)
    .bind(s.comments)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn list_youtube_daily(
    pool: &DbPool,
    property_id: Uuid,
    start: NaiveDate,
    end: NaiveDate,
) -> AppResult<Vec<YoutubeDailyRow>> {
    let rows = sqlx::query_as::<_, YoutubeDailyRow>(
        r#"
        SELECT date, views, estimated_minutes_watched, average_view_duration,
               subscribers_gained, subscribers_lost, likes, dislikes, shares, comments
        FROM cms.youtube_daily_stats
        WHERE property_id = $1 AND date BETWEEN $2 AND $3
        ORDER BY date ASC
        "#,
    )
    .bind(property_id)
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
