use anyhow::Context;
use sqlx::{postgres::PgRow, Row};
use withdami_api::{
    Admin, AdminId, Article, ArticleId, ArticleUpdate, AuthToken, ClientId, Comment, CommentId,
    LikeState, NewAdmin, NewArticle, NewComment, NewLike, NewSession, NewVideo, SearchResults,
    Stats, Subject, Uuid, Video, VideoId, VideoUpdate,
};

use crate::Error;

pub async fn recover_session(
    conn: &mut sqlx::PgConnection,
    token: AuthToken,
) -> Result<AdminId, Error> {
    let row = sqlx::query("SELECT admin_id FROM sessions WHERE id = $1")
        .bind(token.0)
        .fetch_optional(&mut *conn)
        .await
        .context("querying sessions table")?;
    match row {
        Some(row) => Ok(AdminId(
            row.try_get("admin_id")
                .context("retrieving the admin_id field")?,
        )),
        None => Err(Error::permission_denied()),
    }
}

pub async fn login_admin(
    conn: &mut sqlx::PgConnection,
    s: &NewSession,
) -> anyhow::Result<Option<AuthToken>> {
    let admin = sqlx::query("SELECT id, password_hash FROM admins WHERE name = $1")
        .bind(&s.user)
        .fetch_optional(&mut *conn)
        .await
        .context("querying admins table")?;
    let admin = match admin {
        Some(admin) => admin,
        None => return Ok(None),
    };
    let id: Uuid = admin.try_get("id").context("retrieving the id field")?;
    let hash: String = admin
        .try_get("password_hash")
        .context("retrieving the password_hash field")?;
    if !bcrypt::verify(&s.password, &hash).context("verifying password hash")? {
        return Ok(None);
    }
    let token = AuthToken(Uuid::new_v4());
    sqlx::query(
        "INSERT INTO sessions (id, admin_id, device, created_at) VALUES ($1, $2, $3, NOW())",
    )
    .bind(token.0)
    .bind(id)
    .bind(&s.device)
    .execute(conn)
    .await
    .context("inserting session")?;
    Ok(Some(token))
}

/// Returns whether the session existed at all.
pub async fn logout_admin(conn: &mut sqlx::PgConnection, token: &AuthToken) -> anyhow::Result<bool> {
    let res = sqlx::query("DELETE FROM sessions WHERE id = $1")
        .bind(token.0)
        .execute(conn)
        .await
        .context("deleting session")?;
    Ok(res.rows_affected() > 0)
}

pub async fn fetch_admin(conn: &mut sqlx::PgConnection, id: AdminId) -> anyhow::Result<Admin> {
    let row = sqlx::query("SELECT name FROM admins WHERE id = $1")
        .bind(id.0)
        .fetch_one(conn)
        .await
        .context("querying admins table")?;
    Ok(Admin {
        id,
        name: row.try_get("name").context("retrieving the name field")?,
    })
}

pub async fn create_admin(conn: &mut sqlx::PgConnection, a: NewAdmin) -> Result<(), Error> {
    let hash = bcrypt::hash(&a.initial_password, bcrypt::DEFAULT_COST)
        .context("hashing initial password")?;
    let res = sqlx::query(
        "INSERT INTO admins (id, name, password_hash, created_at) VALUES ($1, $2, $3, NOW())",
    )
    .bind(a.id.0)
    .bind(&a.name)
    .bind(hash)
    .execute(conn)
    .await;
    match res {
        Ok(_) => Ok(()),
        Err(sqlx::Error::Database(err)) if err.constraint() == Some("admins_pkey") => {
            Err(Error::uuid_already_used(a.id.0))
        }
        Err(sqlx::Error::Database(err)) if err.constraint() == Some("admins_name_key") => {
            Err(Error::name_already_used(a.name))
        }
        Err(err) => Err(Error::Anyhow(
            anyhow::Error::new(err).context("inserting admin"),
        )),
    }
}

fn article_from_row(row: &PgRow) -> anyhow::Result<Article> {
    Ok(Article {
        id: ArticleId(row.try_get("id").context("retrieving the id field")?),
        title: row.try_get("title").context("retrieving the title field")?,
        excerpt: row
            .try_get("excerpt")
            .context("retrieving the excerpt field")?,
        content: row
            .try_get("content")
            .context("retrieving the content field")?,
        category: row
            .try_get("category")
            .context("retrieving the category field")?,
        featured_image: row
            .try_get("featured_image")
            .context("retrieving the featured_image field")?,
        tags: row.try_get("tags").context("retrieving the tags field")?,
        reading_time: row
            .try_get("reading_time")
            .context("retrieving the reading_time field")?,
        publish_date: row
            .try_get("publish_date")
            .context("retrieving the publish_date field")?,
        created_at: row
            .try_get("created_at")
            .context("retrieving the created_at field")?,
        updated_at: row
            .try_get("updated_at")
            .context("retrieving the updated_at field")?,
        views: row.try_get("views").context("retrieving the views field")?,
    })
}

const ARTICLE_COLUMNS: &str = "id, title, excerpt, content, category, featured_image, tags,
    reading_time, publish_date, created_at, updated_at, views";

pub async fn fetch_articles(
    conn: &mut sqlx::PgConnection,
    category: Option<&str>,
) -> anyhow::Result<Vec<Article>> {
    let rows = sqlx::query(&format!(
        "
            SELECT {ARTICLE_COLUMNS}
                FROM articles
            WHERE $1::TEXT IS NULL OR category = $1
            ORDER BY publish_date DESC, created_at DESC, id
        "
    ))
    .bind(category)
    .fetch_all(conn)
    .await
    .context("querying articles table")?;
    rows.iter().map(article_from_row).collect()
}

pub async fn fetch_article(
    conn: &mut sqlx::PgConnection,
    id: ArticleId,
) -> Result<Article, Error> {
    let row = sqlx::query(&format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = $1"))
        .bind(id.0)
        .fetch_optional(conn)
        .await
        .context("querying articles table")?;
    match row {
        Some(row) => Ok(article_from_row(&row)?),
        None => Err(Error::not_found(id.0)),
    }
}

pub async fn mark_article_viewed(
    conn: &mut sqlx::PgConnection,
    id: ArticleId,
) -> Result<i64, Error> {
    let row = sqlx::query("UPDATE articles SET views = views + 1 WHERE id = $1 RETURNING views")
        .bind(id.0)
        .fetch_optional(conn)
        .await
        .context("bumping article views")?;
    match row {
        Some(row) => Ok(row.try_get("views").context("retrieving the views field")?),
        None => Err(Error::not_found(id.0)),
    }
}

pub async fn article_categories(conn: &mut sqlx::PgConnection) -> anyhow::Result<Vec<String>> {
    let rows = sqlx::query("SELECT DISTINCT category FROM articles ORDER BY category")
        .fetch_all(conn)
        .await
        .context("querying articles table")?;
    rows.iter()
        .map(|row| {
            row.try_get("category")
                .context("retrieving the category field")
        })
        .collect()
}

pub async fn create_article(conn: &mut sqlx::PgConnection, a: NewArticle) -> Result<(), Error> {
    let res = sqlx::query(
        "
            INSERT INTO articles (id, title, excerpt, content, category, featured_image, tags,
                                  reading_time, publish_date, created_at, updated_at, views)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW(), NOW(), 0)
        ",
    )
    .bind(a.id.0)
    .bind(&a.title)
    .bind(&a.excerpt)
    .bind(&a.content)
    .bind(&a.category)
    .bind(&a.featured_image)
    .bind(&a.tags)
    .bind(&a.reading_time)
    .bind(a.publish_date)
    .execute(conn)
    .await;
    match res {
        Ok(_) => Ok(()),
        Err(sqlx::Error::Database(err)) if err.constraint() == Some("articles_pkey") => {
            Err(Error::uuid_already_used(a.id.0))
        }
        Err(err) => Err(Error::Anyhow(
            anyhow::Error::new(err).context("inserting article"),
        )),
    }
}

pub async fn update_article(
    conn: &mut sqlx::PgConnection,
    id: ArticleId,
    u: ArticleUpdate,
) -> Result<(), Error> {
    let res = sqlx::query(
        "
            UPDATE articles
            SET title = $2, excerpt = $3, content = $4, category = $5, featured_image = $6,
                tags = $7, reading_time = $8, publish_date = $9, updated_at = NOW()
            WHERE id = $1
        ",
    )
    .bind(id.0)
    .bind(&u.title)
    .bind(&u.excerpt)
    .bind(&u.content)
    .bind(&u.category)
    .bind(&u.featured_image)
    .bind(&u.tags)
    .bind(&u.reading_time)
    .bind(u.publish_date)
    .execute(conn)
    .await
    .context("updating article")?;
    match res.rows_affected() {
        0 => Err(Error::not_found(id.0)),
        _ => Ok(()),
    }
}

/// Comments and likes on the article go away with it.
pub async fn delete_article(conn: &mut sqlx::PgConnection, id: ArticleId) -> Result<(), Error> {
    let res = sqlx::query("DELETE FROM articles WHERE id = $1")
        .bind(id.0)
        .execute(conn)
        .await
        .context("deleting article")?;
    match res.rows_affected() {
        0 => Err(Error::not_found(id.0)),
        _ => Ok(()),
    }
}

fn video_from_row(row: &PgRow) -> anyhow::Result<Video> {
    Ok(Video {
        id: VideoId(row.try_get("id").context("retrieving the id field")?),
        title: row.try_get("title").context("retrieving the title field")?,
        description: row
            .try_get("description")
            .context("retrieving the description field")?,
        youtube_id: row
            .try_get("youtube_id")
            .context("retrieving the youtube_id field")?,
        category: row
            .try_get("category")
            .context("retrieving the category field")?,
        thumbnail: row
            .try_get("thumbnail")
            .context("retrieving the thumbnail field")?,
        duration: row
            .try_get("duration")
            .context("retrieving the duration field")?,
        publish_date: row
            .try_get("publish_date")
            .context("retrieving the publish_date field")?,
        created_at: row
            .try_get("created_at")
            .context("retrieving the created_at field")?,
        updated_at: row
            .try_get("updated_at")
            .context("retrieving the updated_at field")?,
        views: row.try_get("views").context("retrieving the views field")?,
    })
}

const VIDEO_COLUMNS: &str = "id, title, description, youtube_id, category, thumbnail,
    duration, publish_date, created_at, updated_at, views";

pub async fn fetch_videos(
    conn: &mut sqlx::PgConnection,
    category: Option<&str>,
) -> anyhow::Result<Vec<Video>> {
    let rows = sqlx::query(&format!(
        "
            SELECT {VIDEO_COLUMNS}
                FROM videos
            WHERE $1::TEXT IS NULL OR category = $1
            ORDER BY publish_date DESC, created_at DESC, id
        "
    ))
    .bind(category)
    .fetch_all(conn)
    .await
    .context("querying videos table")?;
    rows.iter().map(video_from_row).collect()
}

pub async fn fetch_video(conn: &mut sqlx::PgConnection, id: VideoId) -> Result<Video, Error> {
    let row = sqlx::query(&format!("SELECT {VIDEO_COLUMNS} FROM videos WHERE id = $1"))
        .bind(id.0)
        .fetch_optional(conn)
        .await
        .context("querying videos table")?;
    match row {
        Some(row) => Ok(video_from_row(&row)?),
        None => Err(Error::not_found(id.0)),
    }
}

pub async fn mark_video_viewed(conn: &mut sqlx::PgConnection, id: VideoId) -> Result<i64, Error> {
    let row = sqlx::query("UPDATE videos SET views = views + 1 WHERE id = $1 RETURNING views")
        .bind(id.0)
        .fetch_optional(conn)
        .await
        .context("bumping video views")?;
    match row {
        Some(row) => Ok(row.try_get("views").context("retrieving the views field")?),
        None => Err(Error::not_found(id.0)),
    }
}

pub async fn video_categories(conn: &mut sqlx::PgConnection) -> anyhow::Result<Vec<String>> {
    let rows = sqlx::query("SELECT DISTINCT category FROM videos ORDER BY category")
        .fetch_all(conn)
        .await
        .context("querying videos table")?;
    rows.iter()
        .map(|row| {
            row.try_get("category")
                .context("retrieving the category field")
        })
        .collect()
}

pub async fn create_video(conn: &mut sqlx::PgConnection, v: NewVideo) -> Result<(), Error> {
    let thumbnail = v.thumbnail_or_default();
    let res = sqlx::query(
        "
            INSERT INTO videos (id, title, description, youtube_id, category, thumbnail,
                                duration, publish_date, created_at, updated_at, views)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW(), NOW(), 0)
        ",
    )
    .bind(v.id.0)
    .bind(&v.title)
    .bind(&v.description)
    .bind(&v.youtube_id)
    .bind(&v.category)
    .bind(thumbnail)
    .bind(&v.duration)
    .bind(v.publish_date)
    .execute(conn)
    .await;
    match res {
        Ok(_) => Ok(()),
        Err(sqlx::Error::Database(err)) if err.constraint() == Some("videos_pkey") => {
            Err(Error::uuid_already_used(v.id.0))
        }
        Err(err) => Err(Error::Anyhow(
            anyhow::Error::new(err).context("inserting video"),
        )),
    }
}

pub async fn update_video(
    conn: &mut sqlx::PgConnection,
    id: VideoId,
    u: VideoUpdate,
) -> Result<(), Error> {
    let res = sqlx::query(
        "
            UPDATE videos
            SET title = $2, description = $3, youtube_id = $4, category = $5, thumbnail = $6,
                duration = $7, publish_date = $8, updated_at = NOW()
            WHERE id = $1
        ",
    )
    .bind(id.0)
    .bind(&u.title)
    .bind(&u.description)
    .bind(&u.youtube_id)
    .bind(&u.category)
    .bind(&u.thumbnail)
    .bind(&u.duration)
    .bind(u.publish_date)
    .execute(conn)
    .await
    .context("updating video")?;
    match res.rows_affected() {
        0 => Err(Error::not_found(id.0)),
        _ => Ok(()),
    }
}

/// Comments and likes on the video go away with it.
pub async fn delete_video(conn: &mut sqlx::PgConnection, id: VideoId) -> Result<(), Error> {
    let res = sqlx::query("DELETE FROM videos WHERE id = $1")
        .bind(id.0)
        .execute(conn)
        .await
        .context("deleting video")?;
    match res.rows_affected() {
        0 => Err(Error::not_found(id.0)),
        _ => Ok(()),
    }
}

pub async fn search(conn: &mut sqlx::PgConnection, q: &str) -> anyhow::Result<SearchResults> {
    if q.trim().is_empty() {
        return Ok(SearchResults {
            articles: Vec::new(),
            videos: Vec::new(),
        });
    }
    let pattern = format!(
        "%{}%",
        q.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
    );
    let rows = sqlx::query(&format!(
        "
            SELECT {ARTICLE_COLUMNS}
                FROM articles
            WHERE title ILIKE $1 OR excerpt ILIKE $1 OR category ILIKE $1
            ORDER BY publish_date DESC, created_at DESC, id
            LIMIT 5
        "
    ))
    .bind(&pattern)
    .fetch_all(&mut *conn)
    .await
    .context("searching articles table")?;
    let articles = rows
        .iter()
        .map(article_from_row)
        .collect::<anyhow::Result<Vec<Article>>>()?;
    let rows = sqlx::query(&format!(
        "
            SELECT {VIDEO_COLUMNS}
                FROM videos
            WHERE title ILIKE $1 OR description ILIKE $1 OR category ILIKE $1
            ORDER BY publish_date DESC, created_at DESC, id
            LIMIT 5
        "
    ))
    .bind(&pattern)
    .fetch_all(conn)
    .await
    .context("searching videos table")?;
    let videos = rows
        .iter()
        .map(video_from_row)
        .collect::<anyhow::Result<Vec<Video>>>()?;
    Ok(SearchResults { articles, videos })
}

pub async fn stats(conn: &mut sqlx::PgConnection) -> anyhow::Result<Stats> {
    let row = sqlx::query(
        "
            SELECT
                (SELECT COUNT(*) FROM articles) AS articles,
                (SELECT COUNT(*) FROM videos) AS videos,
                (SELECT COUNT(*) FROM comments) AS comments,
                (SELECT COUNT(*) FROM likes) AS likes
        ",
    )
    .fetch_one(conn)
    .await
    .context("counting table sizes")?;
    Ok(Stats {
        articles: row
            .try_get("articles")
            .context("retrieving the articles field")?,
        videos: row
            .try_get("videos")
            .context("retrieving the videos field")?,
        comments: row
            .try_get("comments")
            .context("retrieving the comments field")?,
        likes: row.try_get("likes").context("retrieving the likes field")?,
    })
}

fn comment_from_row(row: &PgRow) -> anyhow::Result<Comment> {
    let article: Option<Uuid> = row
        .try_get("article_id")
        .context("retrieving the article_id field")?;
    let video: Option<Uuid> = row
        .try_get("video_id")
        .context("retrieving the video_id field")?;
    Ok(Comment {
        id: CommentId(row.try_get("id").context("retrieving the id field")?),
        author_name: row
            .try_get("author_name")
            .context("retrieving the author_name field")?,
        body: row.try_get("body").context("retrieving the body field")?,
        subject: Subject::from_query(article.map(ArticleId), video.map(VideoId))
            .context("interpreting subject columns")?,
        parent_id: row
            .try_get::<Option<Uuid>, _>("parent_id")
            .context("retrieving the parent_id field")?
            .map(CommentId),
        approved: row
            .try_get("approved")
            .context("retrieving the approved field")?,
        created_at: row
            .try_get("created_at")
            .context("retrieving the created_at field")?,
        updated_at: row
            .try_get("updated_at")
            .context("retrieving the updated_at field")?,
    })
}

pub async fn fetch_comments_for(
    conn: &mut sqlx::PgConnection,
    subject: Subject,
    approved_only: bool,
) -> anyhow::Result<Vec<Comment>> {
    let rows = sqlx::query(
        "
            SELECT id, author_name, body, article_id, video_id, parent_id, approved,
                   created_at, updated_at
                FROM comments
            WHERE (article_id = $1 OR video_id = $2)
                AND (NOT $3 OR approved)
            ORDER BY created_at DESC, id
        ",
    )
    .bind(subject.article_uuid())
    .bind(subject.video_uuid())
    .bind(approved_only)
    .fetch_all(conn)
    .await
    .context("querying comments table")?;
    rows.iter().map(comment_from_row).collect()
}

pub async fn create_comment(conn: &mut sqlx::PgConnection, c: NewComment) -> Result<(), Error> {
    let res = sqlx::query(
        "
            INSERT INTO comments (id, author_name, body, article_id, video_id, parent_id,
                                  approved, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, TRUE, $7, $7)
        ",
    )
    .bind(c.id.0)
    .bind(&c.author_name)
    .bind(&c.body)
    .bind(c.subject.article_uuid())
    .bind(c.subject.video_uuid())
    .bind(c.parent_id.map(|p| p.0))
    .bind(c.created_at)
    .execute(conn)
    .await;
    match res {
        Ok(_) => Ok(()),
        Err(sqlx::Error::Database(err)) if err.constraint() == Some("comments_pkey") => {
            Err(Error::uuid_already_used(c.id.0))
        }
        Err(sqlx::Error::Database(err))
            if err.constraint() == Some("comments_article_id_fkey")
                || err.constraint() == Some("comments_video_id_fkey") =>
        {
            Err(Error::not_found(c.subject.as_query_pair().1))
        }
        Err(err) => Err(Error::Anyhow(
            anyhow::Error::new(err).context("inserting comment"),
        )),
    }
}

pub async fn set_comment_approved(
    conn: &mut sqlx::PgConnection,
    id: CommentId,
    approved: bool,
) -> Result<(), Error> {
    let res = sqlx::query("UPDATE comments SET approved = $2, updated_at = NOW() WHERE id = $1")
        .bind(id.0)
        .bind(approved)
        .execute(conn)
        .await
        .context("updating comment approval")?;
    match res.rows_affected() {
        0 => Err(Error::not_found(id.0)),
        _ => Ok(()),
    }
}

/// Replies are left in place; they surface as top-level comments afterwards.
pub async fn delete_comment(conn: &mut sqlx::PgConnection, id: CommentId) -> Result<(), Error> {
    let res = sqlx::query("DELETE FROM comments WHERE id = $1")
        .bind(id.0)
        .execute(conn)
        .await
        .context("deleting comment")?;
    match res.rows_affected() {
        0 => Err(Error::not_found(id.0)),
        _ => Ok(()),
    }
}

pub async fn like_state(
    conn: &mut sqlx::PgConnection,
    subject: Subject,
    client: ClientId,
) -> anyhow::Result<LikeState> {
    let row = sqlx::query(
        "
            SELECT
                COUNT(*) AS count,
                COUNT(*) FILTER (WHERE client = $3) AS mine
            FROM likes
            WHERE article_id = $1 OR video_id = $2
        ",
    )
    .bind(subject.article_uuid())
    .bind(subject.video_uuid())
    .bind(client.0)
    .fetch_one(conn)
    .await
    .context("counting likes")?;
    let mine: i64 = row.try_get("mine").context("retrieving the mine field")?;
    Ok(LikeState {
        liked: mine > 0,
        count: row.try_get("count").context("retrieving the count field")?,
    })
}

pub async fn create_like(conn: &mut sqlx::PgConnection, l: NewLike) -> Result<(), Error> {
    // A repeated like from the same client is a no-op, not a conflict
    let res = match l.subject {
        Subject::Article(a) => {
            sqlx::query(
                "
                    INSERT INTO likes (id, client, article_id, created_at)
                    VALUES ($1, $2, $3, $4)
                    ON CONFLICT (client, article_id) WHERE article_id IS NOT NULL DO NOTHING
                ",
            )
            .bind(l.id.0)
            .bind(l.client.0)
            .bind(a.0)
            .bind(l.created_at)
            .execute(conn)
            .await
        }
        Subject::Video(v) => {
            sqlx::query(
                "
                    INSERT INTO likes (id, client, video_id, created_at)
                    VALUES ($1, $2, $3, $4)
                    ON CONFLICT (client, video_id) WHERE video_id IS NOT NULL DO NOTHING
                ",
            )
            .bind(l.id.0)
            .bind(l.client.0)
            .bind(v.0)
            .bind(l.created_at)
            .execute(conn)
            .await
        }
    };
    match res {
        Ok(_) => Ok(()),
        Err(sqlx::Error::Database(err)) if err.constraint() == Some("likes_pkey") => {
            Err(Error::uuid_already_used(l.id.0))
        }
        Err(sqlx::Error::Database(err))
            if err.constraint() == Some("likes_article_id_fkey")
                || err.constraint() == Some("likes_video_id_fkey") =>
        {
            Err(Error::not_found(l.subject.as_query_pair().1))
        }
        Err(err) => Err(Error::Anyhow(
            anyhow::Error::new(err).context("inserting like"),
        )),
    }
}

/// Unliking something never liked is fine, nothing to report.
pub async fn delete_like(
    conn: &mut sqlx::PgConnection,
    subject: Subject,
    client: ClientId,
) -> anyhow::Result<()> {
    sqlx::query("DELETE FROM likes WHERE client = $3 AND (article_id = $1 OR video_id = $2)")
        .bind(subject.article_uuid())
        .bind(subject.video_uuid())
        .bind(client.0)
        .execute(conn)
        .await
        .context("deleting like")?;
    Ok(())
}
