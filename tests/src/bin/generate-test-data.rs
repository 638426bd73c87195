use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use rand::Rng;
use uuid::Uuid;

const NUM_ARTICLES: usize = 40;
const NUM_VIDEOS: usize = 25;

const NUM_COMMENTS: usize = 200;
const COMMENT_MAX_WORDS: usize = 40;

const NUM_CLIENTS: usize = 20;
const NUM_LIKES: usize = 300;

const CATEGORIES: &[&str] = &["kubernetes", "terraform", "ci-cd", "linux", "monitoring"];
const AUTHORS: &[&str] = &["cloudfan42", "k8s-newbie", "tf-adept", "sre-tobi", "pipeline-pat"];

fn gen_n_items(table: &str, n: usize, mut f: impl FnMut(usize) -> String) {
    println!("INSERT INTO {} VALUES", table);
    for i in 0..n {
        if i != 0 {
            println!(",");
        }
        print!("    {}", f(i));
    }
    println!();
    println!("ON CONFLICT DO NOTHING;");
}

fn pick<'a>(pool: &[&'a str]) -> &'a str {
    pool[rand::thread_rng().gen_range(0..pool.len())]
}

fn gen_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 1).unwrap() + Duration::days(rand::thread_rng().gen_range(0..700))
}

fn gen_stamp(date: NaiveDate) -> String {
    let mut rng = rand::thread_rng();
    format!(
        "{} {:02}:{:02}:00+00",
        date,
        rng.gen_range(6..23),
        rng.gen_range(0..60)
    )
}

fn gen_youtube_id() -> String {
    let mut rng = rand::thread_rng();
    (0..11)
        .map(|_| rng.sample(rand::distributions::Alphanumeric) as char)
        .collect()
}

fn main() {
    // Generate articles
    let mut articles = Vec::new();
    gen_n_items("articles", NUM_ARTICLES, |_| {
        let id = Uuid::new_v4();
        articles.push(id);
        let category = pick(CATEGORIES);
        let date = gen_date();
        format!(
            "('{}', '{}', '{}', '{}', '{}', 'https://img.example.org/{}.jpg', '{{{},devops}}', '{} min read', '{}', '{}', '{}', {})",
            id,
            lipsum::lipsum_title(),
            lipsum::lipsum_words(12),
            lipsum::lipsum(120),
            category,
            id,
            category,
            rand::thread_rng().gen_range(3..15),
            date,
            gen_stamp(date),
            gen_stamp(date),
            rand::thread_rng().gen_range(0..5000),
        )
    });

    // Generate videos
    let mut videos = Vec::new();
    gen_n_items("videos", NUM_VIDEOS, |_| {
        let id = Uuid::new_v4();
        videos.push(id);
        let youtube_id = gen_youtube_id();
        let date = gen_date();
        format!(
            "('{}', '{}', '{}', '{}', '{}', 'https://img.youtube.com/vi/{}/maxresdefault.jpg', '{}:{:02}', '{}', '{}', '{}', {})",
            id,
            lipsum::lipsum_title(),
            lipsum::lipsum_words(25),
            youtube_id,
            pick(CATEGORIES),
            youtube_id,
            rand::thread_rng().gen_range(3..40),
            rand::thread_rng().gen_range(0..60),
            date,
            gen_stamp(date),
            gen_stamp(date),
            rand::thread_rng().gen_range(0..5000),
        )
    });

    let subjects: Vec<(Option<Uuid>, Option<Uuid>)> = articles
        .iter()
        .map(|a| (Some(*a), None))
        .chain(videos.iter().map(|v| (None, Some(*v))))
        .collect();
    let gen_subject = || subjects[rand::thread_rng().gen_range(0..subjects.len())];
    let sql_uuid = |u: Option<Uuid>| match u {
        Some(u) => format!("'{}'", u),
        None => String::from("NULL"),
    };

    // Generate comments, keeping per-subject threads so replies stay on topic
    let mut threads: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    gen_n_items("comments", NUM_COMMENTS, |_| {
        let id = Uuid::new_v4();
        let (article, video) = gen_subject();
        let thread = threads.entry(article.or(video).unwrap()).or_default();
        let parent = match !thread.is_empty() && rand::thread_rng().gen_bool(0.3) {
            true => Some(thread[rand::thread_rng().gen_range(0..thread.len())]),
            false => None,
        };
        thread.push(id);
        let author = match rand::thread_rng().gen_bool(0.5) {
            true => format!("'{}'", pick(AUTHORS)),
            false => String::from("NULL"),
        };
        let stamp = gen_stamp(gen_date());
        format!(
            "('{}', {}, '{}', {}, {}, {}, {}, '{}', '{}')",
            id,
            author,
            lipsum::lipsum_words(rand::thread_rng().gen_range(5..COMMENT_MAX_WORDS)),
            sql_uuid(article),
            sql_uuid(video),
            sql_uuid(parent),
            rand::thread_rng().gen_bool(0.9),
            stamp,
            stamp,
        )
    });

    // Generate likes; duplicate (client, subject) pairs land on the partial
    // unique indexes and get dropped
    let clients: Vec<Uuid> = (0..NUM_CLIENTS).map(|_| Uuid::new_v4()).collect();
    gen_n_items("likes", NUM_LIKES, |_| {
        let (article, video) = gen_subject();
        format!(
            "('{}', '{}', {}, {}, '{}')",
            Uuid::new_v4(),
            clients[rand::thread_rng().gen_range(0..clients.len())],
            sql_uuid(article),
            sql_uuid(video),
            gen_stamp(gen_date()),
        )
    });
}
