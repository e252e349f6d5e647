//! Basic graph pattern queries
//!
//! Ad-hoc exploration of the loaded graph: a conjunction of triple patterns
//! separated by `.`, evaluated by nested-loop join. Terms are `?var`,
//! `prefix:local` (rdf, rdfs, owl, xsd, skos and tf), `<iri>`, `"literal"`
//! (optionally `@lang`) and `a` for `rdf:type`.
//!
//! ```text
//! ?class rdfs:subClassOf tf:Prestamo . ?class rdfs:label ?label
//! ```

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use super::loader::vocab;
use super::model::{GraphTriple, RdfTerm};
use crate::error::QueryError;

/// One solution: variable name (without `?`) to its bound value
pub type Binding = BTreeMap<String, String>;

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?x)
        (?P<var>\?[A-Za-z_][A-Za-z0-9_]*)
        | <(?P<iri>[^<>\s]*)>
        | "(?P<lit>(?:[^"\\]|\\.)*)"(?:@(?P<lang>[A-Za-z]+(?:-[A-Za-z0-9]+)*))?
        | (?P<prefix>[A-Za-z][A-Za-z0-9_-]*)?:(?P<local>[A-Za-z0-9_-]*)
        | (?P<a>\ba\b)
        | (?P<dot>\.)
        "#,
    )
    .unwrap()
});

#[derive(Debug, Clone, PartialEq)]
enum PatternTerm {
    Var(String),
    Const(RdfTerm),
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Term(PatternTerm),
    Dot,
}

fn expand_prefix(prefix: &str, namespace: &str) -> Option<String> {
    let base = match prefix {
        "rdf" => vocab::RDF,
        "rdfs" => vocab::RDFS,
        "owl" => vocab::OWL,
        "xsd" => vocab::XSD,
        "skos" => vocab::SKOS,
        "tf" | "" => namespace,
        _ => return None,
    };
    Some(base.to_string())
}

fn tokenize(pattern: &str, namespace: &str) -> Result<Vec<Token>, QueryError> {
    let mut tokens = Vec::new();
    let mut cursor = 0;

    for caps in TOKEN_RE.captures_iter(pattern) {
        let Some(whole) = caps.get(0) else {
            continue;
        };

        // Anything other than whitespace between tokens is rejected
        let gap = &pattern[cursor..whole.start()];
        if let Some(pos) = gap.find(|c: char| !c.is_whitespace()) {
            return Err(unexpected(pattern, cursor + pos));
        }
        cursor = whole.end();

        let token = if let Some(var) = caps.name("var") {
            Token::Term(PatternTerm::Var(var.as_str()[1..].to_string()))
        } else if let Some(iri) = caps.name("iri") {
            Token::Term(PatternTerm::Const(RdfTerm::Iri(iri.as_str().to_string())))
        } else if let Some(lit) = caps.name("lit") {
            Token::Term(PatternTerm::Const(RdfTerm::Literal {
                value: lit.as_str().replace("\\\"", "\""),
                datatype: None,
                language: caps.name("lang").map(|l| l.as_str().to_string()),
            }))
        } else if let Some(local) = caps.name("local") {
            let prefix = caps.name("prefix").map(|p| p.as_str()).unwrap_or("");
            let base = expand_prefix(prefix, namespace)
                .ok_or_else(|| QueryError::UnknownPrefix(prefix.to_string()))?;
            Token::Term(PatternTerm::Const(RdfTerm::Iri(format!(
                "{}{}",
                base,
                local.as_str()
            ))))
        } else if caps.name("a").is_some() {
            Token::Term(PatternTerm::Const(RdfTerm::Iri(vocab::RDF_TYPE.to_string())))
        } else {
            Token::Dot
        };
        tokens.push(token);
    }

    let rest = &pattern[cursor..];
    if let Some(pos) = rest.find(|c: char| !c.is_whitespace()) {
        return Err(unexpected(pattern, cursor + pos));
    }

    Ok(tokens)
}

fn unexpected(pattern: &str, offset: usize) -> QueryError {
    let token = pattern[offset..]
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_string();
    QueryError::UnexpectedToken { token, offset }
}

/// Group tokens into triple patterns.
fn parse(pattern: &str, namespace: &str) -> Result<Vec<[PatternTerm; 3]>, QueryError> {
    let tokens = tokenize(pattern, namespace)?;

    let mut patterns = Vec::new();
    let mut groups = tokens.split(|t| *t == Token::Dot).peekable();

    while let Some(group) = groups.next() {
        // A trailing `.` leaves an empty last group
        if group.is_empty() && groups.peek().is_none() && !patterns.is_empty() {
            break;
        }
        let index = patterns.len();
        let terms: Vec<PatternTerm> = group
            .iter()
            .filter_map(|token| match token {
                Token::Term(term) => Some(term.clone()),
                Token::Dot => None,
            })
            .collect();
        let [s, p, o]: [PatternTerm; 3] =
            terms
                .try_into()
                .map_err(|found: Vec<PatternTerm>| QueryError::WrongArity {
                    index,
                    found: found.len(),
                })?;
        if matches!(&p, PatternTerm::Const(term) if term.as_iri().is_none()) {
            return Err(QueryError::InvalidPredicate { index });
        }
        patterns.push([s, p, o]);
    }

    if patterns.is_empty() {
        return Err(QueryError::Empty);
    }
    Ok(patterns)
}

fn term_matches(pattern: &RdfTerm, term: &RdfTerm) -> bool {
    match (pattern, term) {
        (
            RdfTerm::Literal {
                value: pv,
                language: pl,
                ..
            },
            RdfTerm::Literal {
                value: v, language: l, ..
            },
        ) => pv == v && (pl.is_none() || pl == l),
        _ => pattern == term,
    }
}

/// Try to extend `binding` so that `pattern` matches `term`.
fn unify(
    pattern: &PatternTerm,
    term: &RdfTerm,
    binding: &mut BTreeMap<String, RdfTerm>,
) -> bool {
    match pattern {
        PatternTerm::Const(c) => term_matches(c, term),
        PatternTerm::Var(name) => match binding.get(name) {
            Some(bound) => bound == term,
            None => {
                binding.insert(name.clone(), term.clone());
                true
            }
        },
    }
}

/// Evaluate a graph pattern against `triples`.
pub fn evaluate(
    pattern: &str,
    triples: &[GraphTriple],
    namespace: &str,
) -> Result<Vec<Binding>, QueryError> {
    if pattern.trim().is_empty() {
        return Err(QueryError::Empty);
    }
    let patterns = parse(pattern, namespace)?;

    let mut solutions: Vec<BTreeMap<String, RdfTerm>> = vec![BTreeMap::new()];

    for [s, p, o] in &patterns {
        let mut next = Vec::new();
        for solution in &solutions {
            for triple in triples {
                let predicate = RdfTerm::Iri(triple.predicate.clone());
                let mut candidate = solution.clone();
                if unify(s, &triple.subject, &mut candidate)
                    && unify(p, &predicate, &mut candidate)
                    && unify(o, &triple.object, &mut candidate)
                {
                    next.push(candidate);
                }
            }
        }
        solutions = next;
        if solutions.is_empty() {
            break;
        }
    }

    Ok(solutions
        .into_iter()
        .map(|solution| {
            solution
                .into_iter()
                .map(|(name, term)| (name, term.lexical().to_string()))
                .collect()
        })
        .collect())
}
