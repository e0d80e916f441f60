//! CLI command implementations.

use colored::Colorize;
use rand::rngs::StdRng;
use rand::SeedableRng;
use spelltree_core::config::CONFIG_FILE_NAME;
use spelltree_core::{EngineConfig, RawTree};
use spelltree_graph::{
    compute_all_depths, diagnose, inject_prerequisites, prepare_tree, CategoryDiagnostics,
    GraphBuilder, PreparedTree,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Command-line overrides for the injection settings.
#[derive(Debug, Default)]
pub struct InjectOverrides {
    pub chance: Option<u32>,
    pub max_prerequisites: Option<usize>,
    pub min_tier: Option<u32>,
    pub any_tier: bool,
}

/// Write a default config file into a directory.
pub fn init(path: &Path) -> Result<()> {
    let config_path = path.join(CONFIG_FILE_NAME);

    if config_path.exists() {
        println!("{} Already initialized", "✓".green());
        return Ok(());
    }

    fs::create_dir_all(path)?;
    EngineConfig::default().save(&config_path)?;

    println!("{} Initialized Spelltree in {}", "✓".green(), path.display());
    println!("  Run {} to inspect a tree", "spelltree check <tree.json>".cyan());

    Ok(())
}

/// Report problems without changing anything.
pub fn check(tree: &Path, config: Option<&Path>, json_output: bool) -> Result<()> {
    let config = load_config(tree, config)?;
    let raw = load_tree(tree)?;

    let mut output = GraphBuilder::from_raw(&raw)?;
    compute_all_depths(&mut output.graph);
    let diagnostics = diagnose(&output.graph, &config.repair);

    if json_output {
        println!("{}", serde_json::to_string_pretty(&diagnostics)?);
        return Ok(());
    }

    for skipped in &output.skipped {
        println!(
            "{} Skipped school {}: {}",
            "⚠".yellow(),
            skipped.name.cyan(),
            skipped.reason
        );
    }
    if !output.duplicate_ids.is_empty() {
        println!(
            "{} Duplicate ids (first kept): {}",
            "⚠".yellow(),
            output.duplicate_ids.join(", ")
        );
    }

    for school in &diagnostics.categories {
        print_school(school);
    }

    println!();
    if diagnostics.is_clean() {
        println!("{} {}", "✓".green(), diagnostics.summary());
    } else {
        println!("{} {}", "⚠".yellow(), diagnostics.summary());
        if diagnostics.needs_repair() {
            println!("  Run {} to fix orphans", "spelltree repair".cyan());
        }
    }

    Ok(())
}

fn print_school(school: &CategoryDiagnostics) {
    let marker = if school.is_clean() {
        "✓".green()
    } else {
        "•".yellow()
    };
    println!(
        "{} {} ({} of {} obtainable)",
        marker,
        school.category.bold(),
        school.reachable_count,
        school.total_nodes
    );

    if school.orphan_count > 0 {
        println!(
            "    {} orphan(s) in {} subtree(s)",
            school.orphan_count.to_string().yellow(),
            school.subtree_sizes.len()
        );
    }
    if school.missing_prerequisite_count > 0 {
        println!(
            "    {} missing reference(s): {}",
            school.missing_prerequisite_count.to_string().red(),
            school.missing_prerequisite_ids.join(", ").dimmed()
        );
    }
    for chain in &school.example_blocking_chains {
        println!("    {} {}", "blocked:".red(), chain.join(" <- "));
    }
    if school.unobtainable_count > school.example_blocking_chains.len() {
        println!(
            "    ... and {} more unobtainable",
            school.unobtainable_count - school.example_blocking_chains.len()
        );
    }
    for cycle in &school.cycles {
        println!("    {} {}", "cycle:".red(), cycle.join(", "));
    }
    if !school.max_children_violations.is_empty() {
        println!(
            "    over children cap: {}",
            school.max_children_violations.join(", ").dimmed()
        );
    }
}

/// Repair a tree and write it back.
pub fn repair(
    tree: &Path,
    config: Option<&Path>,
    output: Option<&Path>,
    dry_run: bool,
) -> Result<()> {
    let config = load_config(tree, config)?;
    let mut raw = load_tree(tree)?;
    let prepared = prepare_tree(&raw, &config)?;

    let report = &prepared.repair;
    println!(
        "{} Removed {} dangling reference(s), reconnected {} subtree(s) ({} node(s))",
        "✓".green(),
        report.removed_references.to_string().cyan(),
        report.subtrees_reconnected.to_string().cyan(),
        report.nodes_recovered.to_string().cyan()
    );
    if !report.unrepaired.is_empty() {
        println!(
            "{} Could not reattach: {}",
            "⚠".yellow(),
            report.unrepaired.join(", ")
        );
    }

    if dry_run {
        println!("  Dry run, nothing written");
        return Ok(());
    }

    let out_path = output.unwrap_or(tree);
    save_tree(&prepared, &mut raw, out_path)?;
    Ok(())
}

/// Add random extra prerequisites and write the tree back.
pub fn inject(
    tree: &Path,
    config: Option<&Path>,
    overrides: &InjectOverrides,
    seed: Option<u64>,
    output: Option<&Path>,
) -> Result<()> {
    let mut config = load_config(tree, config)?;
    apply_overrides(&mut config, overrides);
    config.validate()?;

    let mut raw = load_tree(tree)?;
    let mut prepared = prepare_tree(&raw, &config)?;

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let report = inject_prerequisites(&mut prepared.graph, &config.injection, &mut rng);
    compute_all_depths(&mut prepared.graph);

    println!(
        "{} Added {} prerequisite(s) ({} eligible, {} rolled)",
        "✓".green(),
        report.added.len().to_string().cyan(),
        report.eligible,
        report.rolled
    );
    for (from, to) in report.added.iter().take(10) {
        println!("  {} {} {}", from, "->".dimmed(), to);
    }
    if report.added.len() > 10 {
        println!("  ... and {} more", report.added.len() - 10);
    }

    let out_path = output.unwrap_or(tree);
    save_tree(&prepared, &mut raw, out_path)?;
    Ok(())
}

/// Export the repaired graph as flat JSON.
pub fn export(tree: &Path, config: Option<&Path>, output: &Path) -> Result<()> {
    let config = load_config(tree, config)?;
    let raw = load_tree(tree)?;
    let prepared = prepare_tree(&raw, &config)?;

    fs::write(output, prepared.graph.export().to_json_pretty()?)?;
    println!("{} Exported to {}", "✓".green(), output.display());

    Ok(())
}

/// Show node, edge and depth statistics.
pub fn status(tree: &Path, config: Option<&Path>) -> Result<()> {
    let config = load_config(tree, config)?;
    let raw = load_tree(tree)?;
    let prepared = prepare_tree(&raw, &config)?;
    let stats = prepared.graph.stats();

    println!("{}", "Spelltree Status".cyan().bold());
    println!("  Nodes:   {}", stats.node_count.to_string().cyan());
    println!("  Edges:   {}", stats.edge_count.to_string().cyan());
    println!("  Schools: {}", stats.categories.to_string().cyan());
    println!("  Roots:   {}", stats.roots.to_string().cyan());
    println!();

    for category in prepared.graph.categories() {
        println!(
            "  {} depth {} width {} ({} nodes, {} element roots)",
            category.name.bold(),
            category.max_depth,
            category.max_width,
            category.node_ids.len(),
            category.element_roots.len()
        );
    }

    Ok(())
}

fn apply_overrides(config: &mut EngineConfig, overrides: &InjectOverrides) {
    let injection = &mut config.injection;
    if let Some(chance) = overrides.chance {
        injection.chance = chance;
    }
    if let Some(max) = overrides.max_prerequisites {
        injection.max_prerequisites = max;
    }
    if let Some(tier) = overrides.min_tier {
        injection.min_tier = tier;
    }
    if overrides.any_tier {
        injection.same_tier_preference = false;
    }
}

/// Explicit path, else `spelltree.json` next to the tree, else defaults.
fn load_config(tree: &Path, explicit: Option<&Path>) -> Result<EngineConfig> {
    let config = match explicit {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::load_or_default(&default_config_path(tree))?,
    };
    config.validate()?;
    Ok(config)
}

fn default_config_path(tree: &Path) -> PathBuf {
    tree.parent()
        .unwrap_or_else(|| Path::new("."))
        .join(CONFIG_FILE_NAME)
}

fn load_tree(path: &Path) -> Result<RawTree> {
    let text = fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    Ok(RawTree::from_json(&text)?)
}

fn save_tree(prepared: &PreparedTree, raw: &mut RawTree, path: &Path) -> Result<()> {
    let written = prepared.graph.write_back(raw);
    debug!("Updated {} node record(s)", written);

    fs::write(path, raw.to_json_pretty()?)?;
    println!("{} Wrote {}", "✓".green(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const TREE: &str = r#"{
        "schools": {
            "Destruction": {
                "root": "R",
                "nodes": [
                    { "formId": "R", "tier": 0, "x": 1.5 },
                    { "formId": "N1", "tier": 1, "prerequisites": ["R"] },
                    { "formId": "N2", "tier": 2, "prerequisites": ["N1"] },
                    { "formId": "Z", "tier": 1, "prerequisites": ["0xDEAD"] }
                ]
            }
        }
    }"#;

    fn write_tree(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("tree.json");
        fs::write(&path, TREE).unwrap();
        path
    }

    fn read_node<'a>(raw: &'a RawTree, id: &str) -> &'a spelltree_core::RawNode {
        raw.schools.as_ref().unwrap()["Destruction"]
            .nodes
            .as_ref()
            .unwrap()
            .iter()
            .find(|n| n.id() == Some(id))
            .unwrap()
    }

    #[test]
    fn test_init_writes_default_config() {
        let dir = TempDir::new().unwrap();
        init(dir.path()).unwrap();

        let config = EngineConfig::load(&dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(config, EngineConfig::default());

        // Second run leaves the file alone
        init(dir.path()).unwrap();
    }

    #[test]
    fn test_repair_writes_fixed_tree() {
        let dir = TempDir::new().unwrap();
        let tree = write_tree(&dir);
        let out = dir.path().join("fixed.json");

        repair(&tree, None, Some(&out), false).unwrap();

        let fixed = RawTree::from_json(&fs::read_to_string(&out).unwrap()).unwrap();
        let z = read_node(&fixed, "Z");
        assert_eq!(z.prerequisites, Some(vec!["N1".to_string()]));
        assert_eq!(z.depth, Some(2));
        assert_eq!(read_node(&fixed, "R").extra["x"], 1.5);

        // Input untouched
        assert_eq!(fs::read_to_string(&tree).unwrap(), TREE);
    }

    #[test]
    fn test_repair_dry_run_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let tree = write_tree(&dir);

        repair(&tree, None, None, true).unwrap();

        assert_eq!(fs::read_to_string(&tree).unwrap(), TREE);
    }

    #[test]
    fn test_inject_is_reproducible_with_seed() {
        let dir = TempDir::new().unwrap();
        let tree = write_tree(&dir);
        let first = dir.path().join("a.json");
        let second = dir.path().join("b.json");
        let overrides = InjectOverrides {
            chance: Some(100),
            ..InjectOverrides::default()
        };

        inject(&tree, None, &overrides, Some(11), Some(&first)).unwrap();
        inject(&tree, None, &overrides, Some(11), Some(&second)).unwrap();

        let a = fs::read_to_string(&first).unwrap();
        assert_eq!(a, fs::read_to_string(&second).unwrap());
        let raw = RawTree::from_json(&a).unwrap();
        // Z was reattached under N1, so it is the one-tier-below candidate
        assert_eq!(
            read_node(&raw, "N2").prerequisites,
            Some(vec!["N1".to_string(), "Z".to_string()])
        );
    }

    #[test]
    fn test_inject_rejects_bad_chance() {
        let dir = TempDir::new().unwrap();
        let tree = write_tree(&dir);
        let overrides = InjectOverrides {
            chance: Some(150),
            ..InjectOverrides::default()
        };

        assert!(inject(&tree, None, &overrides, Some(1), None).is_err());
        assert_eq!(fs::read_to_string(&tree).unwrap(), TREE);
    }

    #[test]
    fn test_export_and_config_lookup() {
        let dir = TempDir::new().unwrap();
        let tree = write_tree(&dir);
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            r#"{ "repair": { "maxChildrenPerNode": 1 } }"#,
        )
        .unwrap();
        let out = dir.path().join("graph.json");

        let config = load_config(&tree, None).unwrap();
        assert_eq!(config.repair.max_children_per_node, 1);

        export(&tree, None, &out).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(value["nodes"].as_array().unwrap().len(), 4);
        assert_eq!(value["categories"][0]["name"], "Destruction");
    }

    #[test]
    fn test_missing_tree_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = check(&dir.path().join("nope.json"), None, false).unwrap_err();
        assert!(err.to_string().contains("cannot read"));
    }
}
