//! Concurrent dual retrieval with graceful single-side degradation.

use doc_index::{LexicalSearch, ScoredCandidate, VectorSearch};
use tracing::{debug, warn};

use crate::error::AnswerError;

/// Runs vector and lexical retrieval concurrently.
///
/// The two calls have no ordering dependency; the fusion step is
/// insensitive to which one finished first. If one side fails the query
/// degrades to single-origin results (logged at `warn`); only both sides
/// failing is fatal.
///
/// # Errors
/// [`AnswerError::RetrievalUnavailable`] when neither side returned.
pub(crate) async fn gather(
    vector: &dyn VectorSearch,
    lexical: &dyn LexicalSearch,
    query: &str,
    top_k: usize,
) -> Result<(Vec<ScoredCandidate>, Vec<ScoredCandidate>), AnswerError> {
    let (v, l) = tokio::join!(vector.search(query, top_k), lexical.search(query, top_k));

    match (v, l) {
        (Ok(v), Ok(l)) => {
            debug!("retrieval: {} vector hits, {} lexical hits", v.len(), l.len());
            Ok((v, l))
        }
        (Ok(v), Err(e)) => {
            warn!("lexical retrieval failed, degrading to vector-only: {e}");
            Ok((v, Vec::new()))
        }
        (Err(e), Ok(l)) => {
            warn!("vector retrieval failed, degrading to lexical-only: {e}");
            Ok((Vec::new(), l))
        }
        (Err(ev), Err(el)) => Err(AnswerError::RetrievalUnavailable(format!(
            "vector: {ev}; lexical: {el}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_index::{IndexError, Origin};
    use std::future::Future;
    use std::pin::Pin;

    struct Fixed(Vec<ScoredCandidate>);
    struct Broken;

    fn hit(source: &str, origin: Origin) -> ScoredCandidate {
        ScoredCandidate {
            source_id: source.into(),
            page: 1,
            text: source.into(),
            score: 1.0,
            origin,
        }
    }

    impl VectorSearch for Fixed {
        fn search<'a>(
            &'a self,
            _query: &'a str,
            _top_k: usize,
        ) -> Pin<Box<dyn Future<Output = Result<Vec<ScoredCandidate>, IndexError>> + Send + 'a>>
        {
            let hits = self.0.clone();
            Box::pin(async move { Ok(hits) })
        }
    }

    impl LexicalSearch for Fixed {
        fn search<'a>(
            &'a self,
            _query: &'a str,
            _top_k: usize,
        ) -> Pin<Box<dyn Future<Output = Result<Vec<ScoredCandidate>, IndexError>> + Send + 'a>>
        {
            let hits = self.0.clone();
            Box::pin(async move { Ok(hits) })
        }
    }

    impl VectorSearch for Broken {
        fn search<'a>(
            &'a self,
            _query: &'a str,
            _top_k: usize,
        ) -> Pin<Box<dyn Future<Output = Result<Vec<ScoredCandidate>, IndexError>> + Send + 'a>>
        {
            Box::pin(async move { Err(IndexError::Parse("vector index down".into())) })
        }
    }

    impl LexicalSearch for Broken {
        fn search<'a>(
            &'a self,
            _query: &'a str,
            _top_k: usize,
        ) -> Pin<Box<dyn Future<Output = Result<Vec<ScoredCandidate>, IndexError>> + Send + 'a>>
        {
            Box::pin(async move { Err(IndexError::Parse("bm25 index down".into())) })
        }
    }

    #[tokio::test]
    async fn one_failed_side_degrades_to_the_other() {
        let lexical = Fixed(vec![hit("b.pdf", Origin::Lexical)]);
        let (v, l) = gather(&Broken, &lexical, "q", 4).await.unwrap();
        assert!(v.is_empty());
        assert_eq!(l.len(), 1);
    }

    #[tokio::test]
    async fn both_sides_failing_is_fatal() {
        let err = gather(&Broken, &Broken, "q", 4).await.unwrap_err();
        assert!(matches!(err, AnswerError::RetrievalUnavailable(_)));
    }
}
