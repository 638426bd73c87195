//! End-to-end checks of the client-side flows, run against the in-memory
//! server so they need no network and no postgres.

#![cfg(test)]

use chrono::{NaiveDate, TimeZone, Utc};
use uuid::Uuid;
use withdami_api::{
    AdminId, ArticleId, ArticleUpdate, AuthToken, ClientId, CommentId, Error, NewAdmin, NewArticle,
    NewComment, NewLike, NewSession, NewVideo, Store, Subject, Time, VideoId,
};
use withdami_client::{like_state, toggle_like, CommentThread};
use withdami_mock_server::MockServer;

fn bootstrapped() -> (MockServer, AuthToken) {
    let mut server = MockServer::new();
    server
        .create_admin(NewAdmin {
            id: AdminId(Uuid::new_v4()),
            name: String::from("dami"),
            initial_password: String::from("hunter2"),
        })
        .expect("creating admin");
    let token = server
        .auth(NewSession::new(
            String::from("dami"),
            String::from("hunter2"),
            String::from("tests"),
        ))
        .expect("logging in");
    (server, token)
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, d).expect("in-range date")
}

fn at(d: u32) -> Time {
    Utc.with_ymd_and_hms(2024, 1, d, 12, 0, 0)
        .single()
        .expect("in-range timestamp")
}

fn new_article(title: &str, category: &str, publish: NaiveDate) -> NewArticle {
    NewArticle {
        id: ArticleId(Uuid::new_v4()),
        title: String::from(title),
        excerpt: format!("{title}, in short"),
        content: lipsum::lipsum(40),
        category: String::from(category),
        featured_image: String::from("https://img.example.org/cover.jpg"),
        tags: vec![String::from(category)],
        reading_time: String::from("5 min read"),
        publish_date: publish,
    }
}

fn new_video(title: &str, category: &str, publish: NaiveDate) -> NewVideo {
    NewVideo {
        id: VideoId(Uuid::new_v4()),
        title: String::from(title),
        description: lipsum::lipsum(20),
        youtube_id: String::from("dQw4w9WgXcQ"),
        category: String::from(category),
        thumbnail: None,
        duration: String::from("12:34"),
        publish_date: publish,
    }
}

fn comment_at(subject: Subject, parent: Option<CommentId>, d: u32, body: &str) -> NewComment {
    NewComment {
        id: CommentId(Uuid::new_v4()),
        author_name: None,
        body: String::from(body),
        subject,
        parent_id: parent,
        created_at: at(d),
    }
}

fn assert_api_err(err: anyhow::Error, want: Error) {
    assert_eq!(err.downcast::<Error>().expect("api error"), want);
}

#[tokio::test]
async fn comment_thread_posts_and_rebuilds() {
    let (mut server, token) = bootstrapped();
    let article = new_article("Zero-downtime deploys", "kubernetes", day(1));
    let subject = Subject::Article(article.id);
    server
        .create_article(token, article)
        .expect("creating article");

    let mut thread = CommentThread::load(&mut server, subject)
        .await
        .expect("loading empty thread");
    assert!(thread.roots.is_empty());

    let parent = comment_at(subject, None, 1, "first!");
    let parent_id = parent.id;
    thread
        .post(&mut server, parent)
        .await
        .expect("posting root comment");
    let reply = comment_at(subject, Some(parent_id), 2, "welcome aboard");
    let reply_id = reply.id;
    thread
        .post(&mut server, reply)
        .await
        .expect("posting reply");
    let late = comment_at(subject, None, 3, "nice article");
    let late_id = late.id;
    thread
        .post(&mut server, late)
        .await
        .expect("posting second root");

    // Newest root first, replies under their parent one level down
    let order = thread
        .walk()
        .map(|(depth, n)| (depth, n.comment.id))
        .collect::<Vec<_>>();
    assert_eq!(order, vec![(0, late_id), (0, parent_id), (1, reply_id)]);
}

#[tokio::test]
async fn rejects_bad_posts_and_keeps_the_tree() {
    let (mut server, token) = bootstrapped();
    let article = new_article("GitOps in practice", "ci-cd", day(1));
    let other = new_article("Terraform state", "terraform", day(2));
    let subject = Subject::Article(article.id);
    let elsewhere = Subject::Article(other.id);
    server
        .create_article(token, article)
        .expect("creating article");
    server
        .create_article(token, other)
        .expect("creating other article");

    let mut thread = CommentThread::load(&mut server, subject)
        .await
        .expect("loading thread");
    thread
        .post(&mut server, comment_at(subject, None, 1, "solid intro"))
        .await
        .expect("posting comment");
    let before = thread.clone();

    let err = thread
        .post(&mut server, comment_at(elsewhere, None, 2, "lost comment"))
        .await
        .expect_err("posting to another subject");
    assert_api_err(err, Error::InvalidSubject);
    assert_eq!(thread, before);

    let err = thread
        .post(&mut server, comment_at(subject, None, 2, "  \n "))
        .await
        .expect_err("posting an empty body");
    assert_api_err(err, Error::EmptyComment);
    assert_eq!(thread, before);
}

#[tokio::test]
async fn moderation_unapproval_and_deletion_orphan_replies() {
    let (mut server, token) = bootstrapped();
    let video = new_video("Intro to containers", "containers", day(1));
    let subject = Subject::Video(video.id);
    server.create_video(token, video).expect("creating video");

    let parent = comment_at(subject, None, 1, "great walkthrough");
    let parent_id = parent.id;
    let reply = comment_at(subject, Some(parent_id), 2, "agreed");
    let reply_id = reply.id;
    server.insert(parent).await.expect("inserting parent");
    server.insert(reply).await.expect("inserting reply");

    // Hiding the parent leaves the reply dangling, so it surfaces as a root
    server
        .set_approved(parent_id, false)
        .await
        .expect("unapproving parent");
    let thread = CommentThread::load(&mut server, subject)
        .await
        .expect("loading thread");
    assert_eq!(thread.roots.len(), 1);
    assert_eq!(thread.roots[0].comment.id, reply_id);
    assert!(thread.roots[0].replies.is_empty());

    // Approving it again nests the reply back where it was
    server
        .set_approved(parent_id, true)
        .await
        .expect("approving parent");
    let thread = CommentThread::load(&mut server, subject)
        .await
        .expect("reloading thread");
    assert_eq!(thread.roots.len(), 1);
    assert_eq!(thread.roots[0].comment.id, parent_id);
    assert_eq!(thread.roots[0].replies[0].comment.id, reply_id);

    // Deletion is for good, and also orphans rather than cascading
    server.delete(parent_id).await.expect("deleting parent");
    let thread = CommentThread::load(&mut server, subject)
        .await
        .expect("reloading thread");
    assert_eq!(thread.roots.len(), 1);
    assert_eq!(thread.roots[0].comment.id, reply_id);
    let all = server
        .fetch_all_for(subject)
        .await
        .expect("fetching moderation view");
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, reply_id);

    let err = server
        .delete(parent_id)
        .await
        .expect_err("deleting a deleted comment");
    assert_api_err(err, Error::NotFound(parent_id.0));
}

#[tokio::test]
async fn like_toggles_are_per_client() {
    let (mut server, token) = bootstrapped();
    let article = new_article("Observability on a budget", "monitoring", day(1));
    let subject = Subject::Article(article.id);
    server
        .create_article(token, article)
        .expect("creating article");

    let alice = ClientId(Uuid::new_v4());
    let bob = ClientId(Uuid::new_v4());

    let state = toggle_like(&mut server, subject, alice)
        .await
        .expect("alice liking");
    assert!(state.liked);
    assert_eq!(state.count, 1);

    let state = toggle_like(&mut server, subject, bob)
        .await
        .expect("bob liking");
    assert!(state.liked);
    assert_eq!(state.count, 2);

    // A repeated insert from the same client does not double count
    server
        .insert_like(NewLike::now(bob, subject))
        .await
        .expect("bob liking again");
    let state = like_state(&mut server, subject, bob)
        .await
        .expect("fetching bob's state");
    assert_eq!(state.count, 2);

    let state = toggle_like(&mut server, subject, alice)
        .await
        .expect("alice unliking");
    assert!(!state.liked);
    assert_eq!(state.count, 1);

    let state = like_state(&mut server, subject, bob)
        .await
        .expect("fetching bob's state");
    assert!(state.liked);
}

#[tokio::test]
async fn likes_require_an_existing_subject() {
    let (mut server, _token) = bootstrapped();
    let nowhere = Subject::Article(ArticleId(Uuid::new_v4()));
    let client = ClientId(Uuid::new_v4());

    let err = server
        .insert_like(NewLike::now(client, nowhere))
        .await
        .expect_err("liking nothing");
    assert_api_err(err, Error::NotFound(nowhere.as_query_pair().1));

    // State reads don't probe existence, they just count zero
    let state = like_state(&mut server, nowhere, client)
        .await
        .expect("fetching state for unknown subject");
    assert_eq!(state.count, 0);
    assert!(!state.liked);
}

#[test]
fn auth_gates_catalog_changes() {
    let (mut server, token) = bootstrapped();

    assert_eq!(
        server.auth(NewSession::new(
            String::from("dami"),
            String::from("wrong"),
            String::from("tests"),
        )),
        Err(Error::PermissionDenied)
    );

    let me = server.whoami(token).expect("whoami");
    assert_eq!(me.name, "dami");

    server.unauth(token).expect("logging out");
    assert_eq!(server.whoami(token), Err(Error::PermissionDenied));
    assert_eq!(
        server.create_article(token, new_article("Stale token", "misc", day(1))),
        Err(Error::PermissionDenied)
    );
}

#[test]
fn admin_names_and_ids_are_unique() {
    let (mut server, _token) = bootstrapped();
    let id = AdminId(Uuid::new_v4());
    assert_eq!(
        server.create_admin(NewAdmin {
            id,
            name: String::from("dami"),
            initial_password: String::from("pw"),
        }),
        Err(Error::NameAlreadyUsed(String::from("dami")))
    );
    server
        .create_admin(NewAdmin {
            id,
            name: String::from("editor"),
            initial_password: String::from("pw"),
        })
        .expect("creating second admin");
    assert_eq!(
        server.create_admin(NewAdmin {
            id,
            name: String::from("someone-else"),
            initial_password: String::from("pw"),
        }),
        Err(Error::UuidAlreadyUsed(id.0))
    );
}

#[test]
fn catalog_lists_filter_and_sort() {
    let (mut server, token) = bootstrapped();
    let a1 = new_article("Kustomize basics", "kubernetes", day(1));
    let a2 = new_article("Helm pitfalls", "kubernetes", day(5));
    let a3 = new_article("Terraform modules", "terraform", day(3));
    let ids = [a1.id, a2.id, a3.id];
    for a in [a1, a2, a3] {
        server.create_article(token, a).expect("creating article");
    }

    let all = server.fetch_articles(None);
    assert_eq!(
        all.iter().map(|a| a.id).collect::<Vec<_>>(),
        vec![ids[1], ids[2], ids[0]]
    );
    let k8s = server.fetch_articles(Some("kubernetes"));
    assert_eq!(
        k8s.iter().map(|a| a.id).collect::<Vec<_>>(),
        vec![ids[1], ids[0]]
    );
    assert_eq!(server.article_categories(), vec!["kubernetes", "terraform"]);

    server
        .update_article(
            token,
            ids[0],
            ArticleUpdate {
                title: String::from("Kustomize, fixed"),
                excerpt: String::from("redone"),
                content: String::from("redone at length"),
                category: String::from("gitops"),
                featured_image: String::from("https://img.example.org/new.jpg"),
                tags: vec![String::from("gitops")],
                reading_time: String::from("7 min read"),
                publish_date: day(2),
            },
        )
        .expect("updating article");
    let got = server.fetch_article(ids[0]).expect("fetching updated");
    assert_eq!(got.title, "Kustomize, fixed");
    assert_eq!(got.category, "gitops");

    assert_eq!(server.mark_article_viewed(ids[0]), Ok(1));
    assert_eq!(server.mark_article_viewed(ids[0]), Ok(2));
    assert_eq!(
        server.mark_article_viewed(ArticleId(Uuid::new_v4())).ok(),
        None
    );
}

#[test]
fn video_thumbnails_fall_back_to_youtube() {
    let (mut server, token) = bootstrapped();
    let video = new_video("Pods explained", "kubernetes", day(1));
    let id = video.id;
    server.create_video(token, video).expect("creating video");
    assert_eq!(
        server.fetch_video(id).expect("fetching video").thumbnail,
        "https://img.youtube.com/vi/dQw4w9WgXcQ/maxresdefault.jpg"
    );
}

#[test]
fn search_matches_both_catalogs_and_truncates() {
    let (mut server, token) = bootstrapped();
    let mut ids = Vec::new();
    for d in 1..=7 {
        let a = new_article(&format!("Terraform tip {d}"), "terraform", day(d));
        ids.push(a.id);
        server.create_article(token, a).expect("creating article");
    }
    server
        .create_video(token, new_video("Terraform crash course", "terraform", day(2)))
        .expect("creating video");
    server
        .create_article(token, new_article("Unrelated", "linux", day(9)))
        .expect("creating unrelated article");

    let hits = server.search("terraform");
    assert_eq!(hits.articles.len(), 5);
    assert_eq!(
        hits.articles.iter().map(|a| a.id).collect::<Vec<_>>(),
        ids.iter().rev().take(5).copied().collect::<Vec<_>>()
    );
    assert_eq!(hits.videos.len(), 1);

    assert!(server.search("  ").articles.is_empty());
    assert!(server.search("TERRAFORM").articles.len() == 5);
}

#[tokio::test]
async fn deleting_a_subject_takes_engagement_with_it() {
    let (mut server, token) = bootstrapped();
    let article = new_article("Soon gone", "misc", day(1));
    let id = article.id;
    let subject = Subject::Article(id);
    server
        .create_article(token, article)
        .expect("creating article");
    server
        .insert(comment_at(subject, None, 1, "sad to see it go"))
        .await
        .expect("inserting comment");
    server
        .insert_like(NewLike::now(ClientId(Uuid::new_v4()), subject))
        .await
        .expect("inserting like");

    let stats = server.stats();
    assert_eq!((stats.articles, stats.comments, stats.likes), (1, 1, 1));

    server.delete_article(token, id).expect("deleting article");
    let stats = server.stats();
    assert_eq!((stats.articles, stats.comments, stats.likes), (0, 0, 0));
}
