//! Filter Registry - rule records loaded from CSV sources.
//!
//! ## Source format
//! Column names are matched case-insensitively:
//! - `id` (or `fid` when there is no `id` column)
//! - `name`
//! - `applicable_if` - defaults to `True` when absent or blank
//! - `expression` - defaults to `False` when absent or blank
//! - `enabled` - only the literal `true` (any case) enables a filter by default
//!
//! A record whose predicate does not compile is rejected and reported; the
//! rest of the source still loads. Multiple sources are concatenated in the
//! order they are loaded.

use crate::context::{ContextBuilder, EvaluationContext};
use crate::error::{EvalError, RegistryError, Result};
use crate::expr::Predicate;
use crate::traits::Filter;
use data_loader::Combination;
use rayon::prelude::*;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Candidates whose contexts are held in memory at once by `initial_counts`.
const COUNT_CHUNK: usize = 4096;

/// One compiled elimination rule.
#[derive(Debug, Clone)]
pub struct FilterRecord {
    pub id: String,
    pub name: String,
    pub applicable: Predicate,
    pub expression: Predicate,
    pub enabled_default: bool,
}

impl FilterRecord {
    /// Compile a record from its raw text fields.
    ///
    /// Blank predicates fall back to `True` (applicability) and `False`
    /// (elimination). The legacy `!==` operator is read as `!=`.
    pub fn compile(
        id: &str,
        name: &str,
        applicable_if: &str,
        expression: &str,
        enabled_default: bool,
    ) -> std::result::Result<Self, String> {
        let id = id.trim();
        if id.is_empty() {
            return Err("missing id".to_string());
        }

        let applicable = compile_or_default(applicable_if, true)
            .map_err(|e| format!("applicable_if: {}", e))?;
        let expression = compile_or_default(expression, false)
            .map_err(|e| format!("expression: {}", e))?;

        Ok(Self {
            id: id.to_string(),
            name: strip_quotes(name).to_string(),
            applicable,
            expression,
            enabled_default,
        })
    }

    /// Unknown identifiers referenced by either predicate.
    pub fn unknown_names(&self) -> Vec<String> {
        let mut names = self.applicable.unknown_names();
        names.extend(self.expression.unknown_names());
        names.sort();
        names.dedup();
        names
    }
}

fn compile_or_default(text: &str, default: bool) -> std::result::Result<Predicate, crate::error::ParseError> {
    let text = strip_quotes(text);
    if text.is_empty() {
        return Ok(Predicate::constant(default));
    }
    Predicate::compile(&text.replace("!==", "!="))
}

/// Trim whitespace, then surrounding double quotes, then single quotes.
fn strip_quotes(s: &str) -> &str {
    s.trim().trim_matches('"').trim_matches('\'')
}

impl Filter for FilterRecord {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn matches(&self, context: &EvaluationContext) -> std::result::Result<bool, EvalError> {
        Ok(self.applicable.evaluate(context)? && self.expression.evaluate(context)?)
    }
}

/// A record that was excluded at load time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedFilter {
    /// Source name (usually the file path)
    pub source: String,
    /// 1-based line in the source
    pub line: u64,
    pub id: String,
    pub reason: String,
}

/// Summary of one load call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    pub rejected: Vec<RejectedFilter>,
    /// (filter id, names it references that no context provides)
    pub unknown_names: Vec<(String, Vec<String>)>,
}

impl LoadReport {
    pub fn merge(&mut self, other: LoadReport) {
        self.loaded += other.loaded;
        self.rejected.extend(other.rejected);
        self.unknown_names.extend(other.unknown_names);
    }
}

/// All loaded filters, in load order.
#[derive(Debug, Clone, Default)]
pub struct FilterRegistry {
    filters: Vec<Arc<FilterRecord>>,
}

impl FilterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: FilterRecord) {
        if self.filters.iter().any(|f| f.id == record.id) {
            warn!("Filter id {} loaded more than once", record.id);
        }
        self.filters.push(Arc::new(record));
    }

    pub fn filters(&self) -> &[Arc<FilterRecord>] {
        &self.filters
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Load every source in order.
    pub fn load_from_paths<P: AsRef<Path>>(paths: &[P]) -> Result<(Self, LoadReport)> {
        let mut registry = Self::new();
        let mut report = LoadReport::default();
        for path in paths {
            report.merge(registry.load_from_path(path.as_ref())?);
        }
        info!(
            "Loaded {} filters from {} sources ({} rejected)",
            registry.len(),
            paths.len(),
            report.rejected.len()
        );
        Ok((registry, report))
    }

    pub fn load_from_path(&mut self, path: &Path) -> Result<LoadReport> {
        let file = File::open(path).map_err(|source| RegistryError::Io {
            path: path.display().to_string(),
            source,
        })?;
        self.load_from_reader(file, &path.display().to_string())
    }

    /// Load records from any CSV reader.
    pub fn load_from_reader<R: Read>(&mut self, reader: R, source_name: &str) -> Result<LoadReport> {
        let csv_error = |source| RegistryError::Csv {
            path: source_name.to_string(),
            source,
        };

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = reader
            .headers()
            .map_err(csv_error)?
            .iter()
            .map(|h| h.trim().trim_start_matches('\u{feff}').to_lowercase())
            .collect();
        let column = |name: &str| headers.iter().position(|h| h == name);

        let id_col = column("id").or_else(|| column("fid"));
        let name_col = column("name");
        let applicable_col = column("applicable_if");
        let expression_col = column("expression");
        let enabled_col = column("enabled");

        let mut report = LoadReport::default();
        for row in reader.records() {
            let row = row.map_err(csv_error)?;
            let field = |col: Option<usize>| col.and_then(|i| row.get(i)).unwrap_or("");
            let line = row.position().map(|p| p.line()).unwrap_or(0);

            let id = field(id_col).trim();
            let enabled = field(enabled_col).eq_ignore_ascii_case("true");

            match FilterRecord::compile(
                id,
                field(name_col),
                field(applicable_col),
                field(expression_col),
                enabled,
            ) {
                Ok(record) => {
                    let unknown = record.unknown_names();
                    if !unknown.is_empty() {
                        warn!(
                            "Filter {} references unknown names [{}]; it will never match",
                            record.id,
                            unknown.join(", ")
                        );
                        report.unknown_names.push((record.id.clone(), unknown));
                    }
                    self.push(record);
                    report.loaded += 1;
                }
                Err(reason) => {
                    warn!("Rejected filter {} ({} line {}): {}", display_id(id), source_name, line, reason);
                    report.rejected.push(RejectedFilter {
                        source: source_name.to_string(),
                        line,
                        id: id.to_string(),
                        reason,
                    });
                }
            }
        }

        debug!("Loaded {} filters from {}", report.loaded, source_name);
        Ok(report)
    }

    /// How many of `candidates` each filter would remove on its own.
    ///
    /// Uses the same match semantics as the elimination pass but touches
    /// no pool or audit state. One count per registry entry, same order.
    pub fn initial_counts<'a, I>(&self, candidates: I, contexts: &ContextBuilder) -> Vec<usize>
    where
        I: IntoIterator<Item = &'a Combination>,
    {
        let mut counts = vec![0; self.filters.len()];
        let mut candidates = candidates.into_iter();
        let mut chunk: Vec<EvaluationContext> = Vec::with_capacity(COUNT_CHUNK);

        loop {
            chunk.clear();
            chunk.extend(candidates.by_ref().take(COUNT_CHUNK).map(|c| contexts.build(c)));
            if chunk.is_empty() {
                return counts;
            }

            let partial: Vec<usize> = self
                .filters
                .par_iter()
                .map(|filter| {
                    chunk
                        .iter()
                        .filter(|ctx| filter.matches(ctx).unwrap_or(false))
                        .count()
                })
                .collect();
            for (total, n) in counts.iter_mut().zip(partial) {
                *total += n;
            }
        }
    }
}

fn display_id(id: &str) -> &str {
    if id.is_empty() { "?" } else { id }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CSV: &str = "\
ID,Name,Applicable_If,Expression,Enabled
F1,\"High sum\",True,final_sum > 300,TRUE
F2,'Odd heavy',,final_odd_count >= 4,false
F3,Broken,True,final_sum >> 3,true
F4,Legacy,\"True\",\"final_min !== 1\",True
,No id,True,False,true
F5,Unknown name,True,foo > 1,false
F6,Defaults,,,
";

    fn load(csv: &str) -> (FilterRegistry, LoadReport) {
        let mut registry = FilterRegistry::new();
        let report = registry.load_from_reader(csv.as_bytes(), "test.csv").unwrap();
        (registry, report)
    }

    fn combo(numbers: [u8; 5]) -> Combination {
        Combination::new(numbers).unwrap()
    }

    #[test]
    fn test_load_accepts_and_rejects() {
        let (registry, report) = load(CSV);

        let ids: Vec<&str> = registry.filters().iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["F1", "F2", "F4", "F5", "F6"]);
        assert_eq!(report.loaded, 5);

        assert_eq!(report.rejected.len(), 2);
        assert_eq!(report.rejected[0].id, "F3");
        assert_eq!(report.rejected[0].line, 4);
        assert!(report.rejected[0].reason.starts_with("expression:"));
        assert_eq!(report.rejected[1].reason, "missing id");

        assert_eq!(
            report.unknown_names,
            vec![("F5".to_string(), vec!["foo".to_string()])]
        );
    }

    #[test]
    fn test_load_normalizes_fields() {
        let (registry, _) = load(CSV);
        let f = registry.filters();

        assert_eq!(f[0].name, "High sum");
        assert!(f[0].enabled_default);
        assert_eq!(f[1].name, "Odd heavy");
        assert_eq!(f[1].applicable.source(), "True");
        assert!(!f[1].enabled_default);
        assert_eq!(f[2].expression.source(), "final_min != 1");
        assert_eq!(f[4].applicable.source(), "True");
        assert_eq!(f[4].expression.source(), "False");
        assert!(!f[4].enabled_default);
    }

    #[test]
    fn test_fid_column_and_missing_columns() {
        let (registry, report) = load("fid,expression\nP1,final_sum < 20\n");
        assert_eq!(report.loaded, 1);
        let f = &registry.filters()[0];
        assert_eq!(f.id, "P1");
        assert_eq!(f.name, "");
        assert!(!f.enabled_default);

        let builder = ContextBuilder::default();
        assert_eq!(f.matches(&builder.build(&combo([1, 2, 3, 4, 5]))), Ok(true));
        assert_eq!(f.matches(&builder.build(&combo([1, 2, 3, 4, 50]))), Ok(false));
    }

    #[test]
    fn test_applicability_gates_elimination() {
        let record = FilterRecord::compile("G", "gated", "final_min > 10", "final_sum > 0", true).unwrap();
        let builder = ContextBuilder::default();
        assert_eq!(record.matches(&builder.build(&combo([1, 20, 30, 40, 50]))), Ok(false));
        assert_eq!(record.matches(&builder.build(&combo([11, 20, 30, 40, 50]))), Ok(true));
    }

    #[test]
    fn test_initial_counts() {
        let (registry, _) = load(CSV);
        let candidates = vec![combo([1, 2, 3, 4, 5]), combo([60, 61, 62, 63, 65])];
        let counts = registry.initial_counts(&candidates, &ContextBuilder::default());

        // both candidates hold three odd numbers, so F2 never fires
        assert_eq!(counts, vec![1, 0, 1, 0, 0]);
    }

    #[test]
    fn test_initial_counts_across_chunks() {
        let (registry, _) = load("id,expression\nLOW,final_sum < 40\nHAS7,7 in combo_numbers\nNONE,False\n");

        // every 5-subset of 1..=20, several chunks' worth
        let mut pool = Vec::new();
        for a in 1..=20u8 {
            for b in a + 1..=20 {
                for c in b + 1..=20 {
                    for d in c + 1..=20 {
                        for e in d + 1..=20 {
                            pool.push(combo([a, b, c, d, e]));
                        }
                    }
                }
            }
        }
        assert_eq!(pool.len(), 15_504);
        assert!(pool.len() > COUNT_CHUNK * 3);

        let low = pool.iter().filter(|c| c.sum() < 40).count();
        let has7 = pool.iter().filter(|c| c.numbers().contains(&7)).count();
        let counts = registry.initial_counts(&pool, &ContextBuilder::default());
        assert_eq!(counts, vec![low, has7, 0]);
        assert_eq!(has7, 3_876);
    }

    #[test]
    fn test_long_and_chain_loads_and_evaluates() {
        let chain = vec!["final_sum > 1"; 20_000].join(" and ");
        let (registry, report) = load(&format!("id,expression\nLONG,{}\n", chain));
        assert_eq!(report.loaded, 1);

        let builder = ContextBuilder::default();
        let f = &registry.filters()[0];
        assert_eq!(f.matches(&builder.build(&combo([1, 2, 3, 4, 5]))), Ok(true));
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        let deep = format!("{}final_sum{} > 1", "(".repeat(100_000), ")".repeat(100_000));
        let (registry, report) = load(&format!("id,expression\nOK,final_sum > 1\nDEEP,{}\n", deep));

        assert_eq!(registry.len(), 1);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].id, "DEEP");
        assert!(report.rejected[0].reason.contains("nested too deeply"));
    }

    #[test]
    fn test_load_from_paths_concatenates() {
        let mut first = tempfile::NamedTempFile::new().unwrap();
        writeln!(first, "id,name,expression\nA,a,final_sum > 1").unwrap();
        let mut second = tempfile::NamedTempFile::new().unwrap();
        writeln!(second, "id,name,expression\nA,again,final_sum > 2\nB,b,bad ===").unwrap();

        let (registry, report) =
            FilterRegistry::load_from_paths(&[first.path(), second.path()]).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.filters()[1].name, "again");
        assert_eq!(report.loaded, 2);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].id, "B");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = FilterRegistry::load_from_paths(&["/definitely/not/here.csv"]).unwrap_err();
        assert!(matches!(err, RegistryError::Io { .. }));
    }
}
