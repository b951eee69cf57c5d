use anyhow::{Context, Result};
use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::Client;

use crate::cycle::PaperSource;

pub const ARXIV_API_URL: &str = "https://export.arxiv.org/api/query";

/// One search result from the arXiv export API. Read-only; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paper {
    pub title: String,
    pub authors: Vec<String>,
    pub summary: String,
    pub entry_id: String,
}

pub struct ArxivClient {
    client: Client,
}

impl ArxivClient {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    /// Run a search query, newest submissions first, capped at
    /// `max_results`. The rest of the program only sees `Paper`s; the Atom
    /// transport stays in this module.
    pub async fn search(&self, query: &str, max_results: u32) -> Result<Vec<Paper>> {
        let url = format!(
            "{}?search_query={}&start=0&max_results={}&sortBy=submittedDate&sortOrder=descending",
            ARXIV_API_URL,
            urlencoding::encode(query),
            max_results
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to reach the arXiv export API")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("unknown error"));
            anyhow::bail!("arXiv API returned error: {} - {}", status, error_text);
        }

        let body = response
            .text()
            .await
            .context("Failed to read arXiv API response")?;

        parse_feed(&body)
    }

    /// Cheap connectivity probe used by the startup wait.
    pub async fn probe(&self) -> bool {
        self.client.get(ARXIV_API_URL).send().await.is_ok()
    }
}

#[async_trait]
impl PaperSource for ArxivClient {
    async fn search(&self, query: &str, max_results: u32) -> Result<Vec<Paper>> {
        ArxivClient::search(self, query, max_results).await
    }
}

fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Pull papers out of an Atom feed. arXiv wraps titles and abstracts across
/// lines, so every captured field gets its whitespace collapsed.
pub fn parse_feed(body: &str) -> Result<Vec<Paper>> {
    let mut reader = Reader::from_reader(body.as_bytes());
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    let mut papers = Vec::new();
    let mut entry: Option<Paper> = None;
    let mut in_author = false;
    let mut text = String::new();

    loop {
        match reader
            .read_event_into(&mut buf)
            .context("Malformed Atom feed from arXiv")?
        {
            Event::Eof => break,
            Event::Start(e) => {
                match e.name().as_ref() {
                    b"entry" => {
                        entry = Some(Paper {
                            title: String::new(),
                            authors: Vec::new(),
                            summary: String::new(),
                            entry_id: String::new(),
                        });
                    }
                    b"author" => in_author = entry.is_some(),
                    _ => {}
                }
                text.clear();
            }
            Event::Text(t) => {
                let piece = t.unescape().context("Malformed Atom feed from arXiv")?;
                if !text.is_empty() {
                    text.push(' ');
                }
                text.push_str(&piece);
            }
            Event::End(e) => {
                if let Some(paper) = entry.as_mut() {
                    let value = collapse_ws(&text);
                    match e.name().as_ref() {
                        b"id" => paper.entry_id = value,
                        b"title" => paper.title = value,
                        b"summary" => paper.summary = value,
                        b"name" if in_author && !value.is_empty() => paper.authors.push(value),
                        b"author" => in_author = false,
                        b"entry" => {
                            if let Some(done) = entry.take() {
                                papers.push(done);
                            }
                        }
                        _ => {}
                    }
                }
                text.clear();
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(papers)
}
