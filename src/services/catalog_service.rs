//! Catalog reconciliation
//!
//! Merges items from the external catalog into the local `books` table by
//! natural key (ISBN first, normalized title as a fallback) and hands back the
//! catalog items with their local ids attached.

use std::collections::{HashMap, HashSet};
use unicode_normalization::UnicodeNormalization;

use crate::domain::{
    BookDraft, BookRepository, CatalogGateway, CatalogQuery, DomainError, NormalizedBook,
};
use crate::models::Book;

/// Title key used when ISBNs do not line up: NFC, no whitespace, lowercase
pub fn normalize_title(title: &str) -> String {
    title
        .nfc()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Writes decided by [`plan_reconciliation`], not yet applied
#[derive(Debug, Default, PartialEq)]
pub struct ReconcilePlan {
    pub updates: Vec<(i32, BookDraft)>,
    pub inserts: Vec<BookDraft>,
}

/// Result of a persisted reconciliation
#[derive(Debug, Default)]
pub struct ReconcileOutcome {
    pub ids_by_isbn: HashMap<String, i32>,
    pub ids_by_title: HashMap<String, i32>,
    pub inserted_count: usize,
    pub updated_count: usize,
}

impl ReconcileOutcome {
    /// Local id for a catalog item: by ISBN, then by normalized title
    pub fn id_for(&self, item: &NormalizedBook) -> Option<i32> {
        item.isbn
            .as_ref()
            .and_then(|isbn| self.ids_by_isbn.get(isbn))
            .or_else(|| self.ids_by_title.get(&normalize_title(&item.title)))
            .copied()
    }
}

fn draft_from(item: &NormalizedBook) -> BookDraft {
    BookDraft {
        title: item.title.clone(),
        author: item.author.clone(),
        publisher: item.publisher.clone(),
        category: item.category.clone(),
        isbn: item.isbn.clone(),
        cover_url: item.cover.clone(),
        description: item.description.clone(),
        pub_date: item.pub_date.clone(),
    }
}

/// Field-level `external ?? local`
fn merge(local: &Book, item: &NormalizedBook) -> BookDraft {
    let title = if item.title.trim().is_empty() {
        local.title.clone()
    } else {
        item.title.clone()
    };

    BookDraft {
        title,
        author: item.author.clone().or_else(|| local.author.clone()),
        publisher: item.publisher.clone().or_else(|| local.publisher.clone()),
        category: item.category.clone().or_else(|| local.category.clone()),
        isbn: local.isbn.clone(),
        cover_url: item.cover.clone().or_else(|| local.cover_url.clone()),
        description: item.description.clone().or_else(|| local.description.clone()),
        pub_date: item.pub_date.clone().or_else(|| local.pub_date.clone()),
    }
}

/// Decide updates and inserts without touching storage.
///
/// On duplicate ISBNs or duplicate normalized titles among the catalog items
/// the first one seen wins.
pub fn plan_reconciliation(existing: &[Book], external: &[NormalizedBook]) -> ReconcilePlan {
    let mut by_isbn: HashMap<&str, &NormalizedBook> = HashMap::new();
    let mut by_title: HashMap<String, &NormalizedBook> = HashMap::new();
    for item in external {
        if let Some(isbn) = item.isbn.as_deref() {
            by_isbn.entry(isbn).or_insert(item);
        }
        by_title.entry(normalize_title(&item.title)).or_insert(item);
    }

    // ISBNs that already belong to a row; a second row must never take them
    let mut claimed: HashSet<String> = existing.iter().filter_map(|b| b.isbn.clone()).collect();
    let mut plan = ReconcilePlan::default();

    for local in existing {
        let Some(id) = local.id else { continue };

        let isbn_match = local
            .isbn
            .as_deref()
            .and_then(|isbn| by_isbn.get(isbn).copied());

        let draft = match isbn_match {
            Some(item) => merge(local, item),
            None => {
                let Some(item) = by_title.get(&normalize_title(&local.title)).copied() else {
                    continue;
                };
                let mut draft = merge(local, item);
                if draft.isbn.is_none()
                    && let Some(isbn) = &item.isbn
                    && claimed.insert(isbn.clone())
                {
                    draft.isbn = Some(isbn.clone());
                }
                draft
            }
        };

        plan.updates.push((id, draft));
    }

    for item in external {
        if let Some(isbn) = &item.isbn
            && claimed.insert(isbn.clone())
        {
            plan.inserts.push(draft_from(item));
        }
    }

    plan
}

/// Plan, persist, then re-read ids for every ISBN the catalog returned.
pub async fn reconcile(
    repo: &dyn BookRepository,
    existing: Vec<Book>,
    external: &[NormalizedBook],
) -> Result<ReconcileOutcome, DomainError> {
    let plan = plan_reconciliation(&existing, external);
    let updated_count = plan.updates.len();
    let inserted_count = plan.inserts.len();

    repo.apply_reconciliation(plan.updates, plan.inserts).await?;

    let requested: Vec<String> = external.iter().filter_map(|b| b.isbn.clone()).collect();
    let ids_by_isbn: HashMap<String, i32> = repo
        .find_by_isbns(&requested)
        .await?
        .into_iter()
        .filter_map(|b| Some((b.isbn?, b.id?)))
        .collect();

    let mut ids_by_title = HashMap::new();
    for book in &existing {
        if let Some(id) = book.id {
            ids_by_title.entry(normalize_title(&book.title)).or_insert(id);
        }
    }

    tracing::debug!(
        "Reconciled {} catalog items: {} updated, {} inserted",
        external.len(),
        updated_count,
        inserted_count
    );

    Ok(ReconcileOutcome {
        ids_by_isbn,
        ids_by_title,
        inserted_count,
        updated_count,
    })
}

pub fn attach_ids(external: Vec<NormalizedBook>, outcome: &ReconcileOutcome) -> Vec<Book> {
    external
        .into_iter()
        .map(|item| {
            let id = outcome.id_for(&item);
            Book::from_catalog(item, id)
        })
        .collect()
}

fn isbns_of(items: &[NormalizedBook]) -> Vec<String> {
    items.iter().filter_map(|b| b.isbn.clone()).collect()
}

/// Keyword search through the catalog, falling back to local matches when the
/// catalog is unreachable.
pub async fn search(
    repo: &dyn BookRepository,
    catalog: &dyn CatalogGateway,
    query: &str,
    max_results: u32,
) -> Result<Vec<Book>, DomainError> {
    let q = query.trim();
    if q.is_empty() {
        return Err(DomainError::validation("Search query is required"));
    }

    let local = repo.search(q, u64::from(max_results)).await?;

    let external = match catalog
        .fetch(&CatalogQuery::Keyword(q.to_string()), max_results)
        .await
    {
        Ok(items) => items,
        Err(DomainError::Upstream(msg)) => {
            tracing::warn!(
                "Catalog unavailable, serving {} local matches for '{}': {}",
                local.len(),
                q,
                msg
            );
            return Ok(local);
        }
        Err(e) => return Err(e),
    };

    let mut existing = repo.find_by_isbns(&isbns_of(&external)).await?;
    // Keyword matches are the candidates for the title fallback
    for book in local {
        if !existing.iter().any(|b| b.id == book.id) {
            existing.push(book);
        }
    }

    let outcome = reconcile(repo, existing, &external).await?;
    Ok(attach_ids(external, &outcome))
}

/// Bestseller / new-arrival listing. No local fallback: upstream failures surface.
pub async fn curated_list(
    repo: &dyn BookRepository,
    catalog: &dyn CatalogGateway,
    query: CatalogQuery,
    max_results: u32,
) -> Result<Vec<Book>, DomainError> {
    let external = catalog.fetch(&query, max_results).await?;
    let existing = repo.find_by_isbns(&isbns_of(&external)).await?;
    let outcome = reconcile(repo, existing, &external).await?;
    Ok(attach_ids(external, &outcome))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local(id: i32, title: &str, isbn: Option<&str>) -> Book {
        Book {
            id: Some(id),
            title: title.to_string(),
            author: Some("Local Author".to_string()),
            publisher: None,
            category: Some("Local Category".to_string()),
            isbn: isbn.map(str::to_string),
            cover_url: None,
            description: Some("local description".to_string()),
            pub_date: None,
            rank: None,
        }
    }

    fn external(title: &str, isbn: Option<&str>) -> NormalizedBook {
        NormalizedBook {
            title: title.to_string(),
            author: Some("Hermann Hesse".to_string()),
            isbn: isbn.map(str::to_string),
            cover: Some(format!("https://img.test/{}.jpg", title)),
            ..Default::default()
        }
    }

    #[test]
    fn test_normalize_title_ignores_spacing_and_case() {
        assert_eq!(normalize_title(" The  Little\tPrince "), "thelittleprince");
        assert_eq!(normalize_title("데 미 안"), normalize_title("데미안"));
    }

    #[test]
    fn test_normalize_title_composes_hangul() {
        // decomposed jamo for "한" vs the precomposed syllable
        assert_eq!(normalize_title("\u{1112}\u{1161}\u{11AB}"), normalize_title("한"));
    }

    #[test]
    fn test_isbn_match_merges_external_over_local() {
        let existing = vec![local(1, "Demian", Some("9788937460449"))];
        let items = vec![NormalizedBook {
            title: "데미안".into(),
            isbn: Some("9788937460449".into()),
            cover: Some("https://img.test/demian.jpg".into()),
            description: None,
            ..Default::default()
        }];

        let plan = plan_reconciliation(&existing, &items);
        assert!(plan.inserts.is_empty());
        assert_eq!(plan.updates.len(), 1);

        let (id, draft) = &plan.updates[0];
        assert_eq!(*id, 1);
        assert_eq!(draft.title, "데미안");
        assert_eq!(draft.cover_url.as_deref(), Some("https://img.test/demian.jpg"));
        // external had nothing, local value survives
        assert_eq!(draft.description.as_deref(), Some("local description"));
        assert_eq!(draft.author.as_deref(), Some("Local Author"));
    }

    #[test]
    fn test_title_fallback_adopts_unclaimed_isbn() {
        let existing = vec![local(7, "데미안", None)];
        let items = vec![external("데 미안", Some("111"))];

        let plan = plan_reconciliation(&existing, &items);
        assert_eq!(plan.updates.len(), 1);
        assert_eq!(plan.updates[0].1.isbn.as_deref(), Some("111"));
        assert!(plan.inserts.is_empty(), "adopted isbn must not be inserted again");
    }

    #[test]
    fn test_title_fallback_never_steals_claimed_isbn() {
        let existing = vec![local(1, "Other Book", Some("111")), local(2, "데미안", None)];
        let items = vec![external("데미안", Some("111"))];

        let plan = plan_reconciliation(&existing, &items);
        let by_id: HashMap<i32, &BookDraft> = plan.updates.iter().map(|(i, d)| (*i, d)).collect();
        assert_eq!(by_id[&1].isbn.as_deref(), Some("111"));
        assert_eq!(by_id[&2].isbn, None);
        assert!(plan.inserts.is_empty());
    }

    #[test]
    fn test_local_isbn_kept_on_title_only_match() {
        let existing = vec![local(3, "데미안", Some("old-isbn"))];
        let items = vec![external("데미안", Some("new-isbn"))];

        let plan = plan_reconciliation(&existing, &items);
        assert_eq!(plan.updates[0].1.isbn.as_deref(), Some("old-isbn"));
        assert_eq!(plan.inserts.len(), 1);
        assert_eq!(plan.inserts[0].isbn.as_deref(), Some("new-isbn"));
    }

    #[test]
    fn test_items_without_isbn_are_never_inserted() {
        let plan = plan_reconciliation(&[], &[external("Unknown", None)]);
        assert_eq!(plan, ReconcilePlan::default());
    }

    #[test]
    fn test_duplicate_isbns_first_seen_wins() {
        let items = vec![external("First", Some("42")), external("Second", Some("42"))];
        let plan = plan_reconciliation(&[], &items);
        assert_eq!(plan.inserts.len(), 1);
        assert_eq!(plan.inserts[0].title, "First");
    }

    #[test]
    fn test_second_pass_only_updates() {
        let items = vec![external("A", Some("1")), external("B", Some("2"))];
        let first = plan_reconciliation(&[], &items);
        assert_eq!(first.inserts.len(), 2);

        // state after the first pass was applied
        let stored: Vec<Book> = first
            .inserts
            .iter()
            .enumerate()
            .map(|(i, d)| local(i as i32 + 1, &d.title, d.isbn.as_deref()))
            .collect();

        let second = plan_reconciliation(&stored, &items);
        assert!(second.inserts.is_empty());
        assert_eq!(second.updates.len(), 2);
    }

    #[test]
    fn test_id_for_falls_back_to_title() {
        let mut outcome = ReconcileOutcome::default();
        outcome.ids_by_isbn.insert("1".into(), 10);
        outcome.ids_by_title.insert(normalize_title("No Isbn Book"), 20);

        assert_eq!(outcome.id_for(&external("whatever", Some("1"))), Some(10));
        assert_eq!(outcome.id_for(&external("No isbn book", None)), Some(20));
        assert_eq!(outcome.id_for(&external("Stranger", None)), None);
    }
}
