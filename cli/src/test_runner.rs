use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use codegen::loader::Loader;
use codegen::{BlockInstance, Extension, GeneratedProgram};

use crate::workspace::BlockEntry;

/// A `.case.toml` file: a workspace plus what generating it should produce.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestCase {
    /// Human-readable test description.
    #[serde(default)]
    pub description: Option<String>,

    /// Extension definition, relative to the case file. Defaults to the built-in blocks.
    #[serde(default)]
    pub extension: Option<String>,

    /// Expected generated code (trimmed comparison).
    #[serde(default)]
    pub expect_output: Option<String>,

    /// Expected generation error — its Display string must contain this substring.
    #[serde(default)]
    pub expect_error: Option<String>,

    /// Expected warnings, as message substrings. If present (even empty), the
    /// warning count is checked too.
    #[serde(default)]
    pub expect_warnings: Option<Vec<String>>,

    #[serde(default, rename = "block")]
    pub blocks: Vec<BlockEntry>,
}

pub enum TestOutcome {
    Pass,
    Fail(String),
}

pub struct TestResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: TestOutcome,
}

impl TestResult {
    fn fail(path: &Path, description: Option<String>, reason: String) -> Self {
        TestResult {
            path: path.to_path_buf(),
            description,
            outcome: TestOutcome::Fail(reason),
        }
    }
}

fn load_case_extension(path: &Path, case: &TestCase) -> Result<Extension, String> {
    let Some(rel) = &case.extension else {
        return codegen::mpu6050::extension().map_err(|e| format!("built-in extension: {}", e));
    };
    let base_dir = path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));
    let ext_path = base_dir.join(rel);
    let source = std::fs::read_to_string(&ext_path)
        .map_err(|e| format!("cannot read extension '{}': {}", ext_path.display(), e))?;
    Loader::new(source, 0).load().map_err(|errs| {
        let msgs: Vec<String> = errs.iter().map(|e| e.message.clone()).collect();
        format!("extension '{}' failed to load: {}", ext_path.display(), msgs.join("; "))
    })
}

fn run_single_test(path: &Path) -> TestResult {
    // 1. Read and parse the case
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => return TestResult::fail(path, None, format!("cannot read file: {}", e)),
    };
    let case: TestCase = match toml::from_str(&content) {
        Ok(c) => c,
        Err(e) => return TestResult::fail(path, None, format!("TOML parse error: {}", e)),
    };
    let description = case.description.clone();

    // 2. Extension
    let extension = match load_case_extension(path, &case) {
        Ok(ext) => ext,
        Err(reason) => return TestResult::fail(path, description, reason),
    };

    // 3. Block instances
    let instances: Result<Vec<BlockInstance>, String> =
        case.blocks.iter().map(|b| b.to_instance()).collect();
    let instances = match instances {
        Ok(i) => i,
        Err(reason) => return TestResult::fail(path, description, reason),
    };

    // 4. Generate and check expectations
    let result = codegen::generate_program(&extension, &instances);
    let outcome = match check_result(&case, &result) {
        Some(reason) => TestOutcome::Fail(reason),
        None => TestOutcome::Pass,
    };

    TestResult {
        path: path.to_path_buf(),
        description,
        outcome,
    }
}

/// Returns `Some(reason)` when the generation result does not match the case.
fn check_result(
    case: &TestCase,
    result: &Result<GeneratedProgram, codegen::BlockFailure>,
) -> Option<String> {
    let outcome = match (&case.expect_error, &case.expect_output, result) {
        (Some(expected_err), _, Err(failure)) => {
            let err_str = failure.to_string();
            if err_str.contains(expected_err.as_str()) {
                None
            } else {
                Some(format!(
                    "expected error containing \"{}\", got: {}",
                    expected_err, err_str
                ))
            }
        }
        (Some(expected_err), _, Ok(_)) => Some(format!(
            "expected error containing \"{}\", but generation succeeded",
            expected_err
        )),
        (None, _, Err(failure)) => Some(format!("unexpected generation error: {}", failure)),
        (None, Some(expected_output), Ok(program)) => {
            let actual = program.source.trim();
            let expected = expected_output.trim();
            if actual == expected {
                None
            } else {
                Some(format!(
                    "output mismatch\n  expected:\n{}\n  actual:\n{}",
                    indent(expected),
                    indent(actual)
                ))
            }
        }
        (None, None, Ok(_)) => None,
    };
    if outcome.is_some() {
        return outcome;
    }

    match (&case.expect_warnings, result) {
        (Some(expected), Ok(program)) => check_warnings(program, expected),
        _ => None,
    }
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|l| format!("    {}", l))
        .collect::<Vec<_>>()
        .join("\n")
}

fn check_warnings(program: &GeneratedProgram, expected: &[String]) -> Option<String> {
    if program.warnings.len() != expected.len() {
        let actual_msgs: Vec<String> = program
            .warnings
            .iter()
            .map(|w| format!("  - {}", w))
            .collect();
        return Some(format!(
            "expected {} warning(s), got {}\n  actual warnings:\n{}",
            expected.len(),
            program.warnings.len(),
            if actual_msgs.is_empty() {
                "    (none)".to_string()
            } else {
                actual_msgs.join("\n")
            }
        ));
    }

    for (i, (actual, expected)) in program.warnings.iter().zip(expected).enumerate() {
        let msg = actual.to_string();
        if !msg.contains(expected.as_str()) {
            return Some(format!(
                "warning[{}]: expected message containing \"{}\", got: {}",
                i, expected, msg
            ));
        }
    }

    None
}

const CASE_SUFFIX: &str = ".case.toml";

/// Case files grouped by their folder relative to `root` ("" for `root` itself),
/// categories and files both sorted.
fn discover_categorized(root: &Path) -> BTreeMap<String, Vec<PathBuf>> {
    let mut categories: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for path in entries.flatten().map(|e| e.path()) {
            if path.is_dir() {
                pending.push(path);
                continue;
            }
            let is_case = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(CASE_SUFFIX));
            if is_case {
                let category = dir
                    .strip_prefix(root)
                    .map(|p| p.to_string_lossy().replace('\\', "/"))
                    .unwrap_or_default();
                categories.entry(category).or_default().push(path);
            }
        }
    }
    for files in categories.values_mut() {
        files.sort();
    }
    categories
}

fn category_label(category: &str) -> &str {
    if category.is_empty() { "(root)" } else { category }
}

/// List available categories for the given case path.
pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("(single file, no categories)");
        return;
    }
    let categories = discover_categorized(path);
    if categories.is_empty() {
        eprintln!("no {} files found in {}", CASE_SUFFIX, path.display());
        return;
    }
    eprintln!("available categories:");
    for (category, files) in &categories {
        eprintln!("  {} ({} cases)", category_label(category), files.len());
    }
}

/// Keep the categories matching a requested name or nested below it.
fn select_categories<'a>(
    all: &'a BTreeMap<String, Vec<PathBuf>>,
    requested: &[String],
) -> BTreeMap<&'a str, &'a [PathBuf]> {
    if requested.is_empty() {
        return all.iter().map(|(k, v)| (k.as_str(), v.as_slice())).collect();
    }
    let mut selected = BTreeMap::new();
    for req in requested {
        let req = req.trim_matches('/');
        let nested = format!("{}/", req);
        let before = selected.len();
        for (category, files) in all {
            if category == req || category.starts_with(&nested) {
                selected.insert(category.as_str(), files.as_slice());
            }
        }
        if selected.len() == before {
            let available: Vec<&str> = all.keys().map(|k| category_label(k)).collect();
            eprintln!(
                "warning: category '{}' not found (available: {})",
                req,
                available.join(", ")
            );
        }
    }
    selected
}

/// Terminal styling for the report, a no-op with `--no-color`.
struct Style {
    color: bool,
}

impl Style {
    fn paint(&self, code: &str, text: &str) -> String {
        if self.color {
            format!("\x1b[{}m{}\x1b[0m", code, text)
        } else {
            text.to_string()
        }
    }

    fn pass(&self) -> String {
        self.paint("32", "PASS")
    }

    fn fail(&self) -> String {
        self.paint("31", "FAIL")
    }

    fn bold(&self, text: &str) -> String {
        self.paint("1", text)
    }
}

fn result_label(result: &TestResult) -> String {
    result.description.clone().unwrap_or_else(|| {
        result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .map(|s| s.trim_end_matches(CASE_SUFFIX).to_string())
            .unwrap_or_else(|| "?".to_string())
    })
}

/// Run every case under `path` (or the single case file `path`), restricted to
/// `categories` when non-empty. Returns the process exit code.
pub fn run_tests(path: &Path, no_color: bool, categories: &[String]) -> i32 {
    let style = Style { color: !no_color };

    let all = if path.is_file() {
        BTreeMap::from([(String::new(), vec![path.to_path_buf()])])
    } else {
        discover_categorized(path)
    };
    if all.is_empty() {
        eprintln!("no {} files found in {}", CASE_SUFFIX, path.display());
        return 1;
    }
    let selected = select_categories(&all, categories);
    if selected.is_empty() {
        eprintln!("no matching categories found");
        return 1;
    }

    let mut passed = 0usize;
    let mut failures: Vec<TestResult> = Vec::new();
    for (category, files) in &selected {
        if !path.is_file() {
            eprintln!();
            eprintln!("{}", style.bold(category_label(category)));
        }
        for file in files.iter() {
            let result = run_single_test(file);
            match result.outcome {
                TestOutcome::Pass => {
                    passed += 1;
                    eprintln!("  {}  {}", style.pass(), result_label(&result));
                }
                TestOutcome::Fail(_) => {
                    eprintln!("  {}  {}", style.fail(), result_label(&result));
                    failures.push(result);
                }
            }
        }
    }

    if !failures.is_empty() {
        eprintln!();
        eprintln!("failures:");
        for failure in &failures {
            eprintln!();
            eprintln!("  --- {} ---", failure.path.display());
            if let TestOutcome::Fail(reason) = &failure.outcome {
                for line in reason.lines() {
                    eprintln!("  {}", line);
                }
            }
        }
    }

    eprintln!();
    if failures.is_empty() {
        eprintln!(
            "test result: {}. {} passed, 0 failed",
            style.paint("32", "ok"),
            passed
        );
        0
    } else {
        eprintln!(
            "test result: {}. {} passed, {} failed (of {})",
            style.paint("31", "FAILED"),
            passed,
            failures.len(),
            passed + failures.len()
        );
        1
    }
}
