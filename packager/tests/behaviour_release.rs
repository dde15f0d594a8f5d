//! Behaviour-driven tests for the release packaging pipeline.
//!
//! Scenarios run against a temporary project seeded with fake build output
//! and a stubbed build tool. Tests use the rstest-bdd v0.5.0 mutable world
//! pattern.

use camino::{Utf8Path, Utf8PathBuf};
use rendertoy_packager::collector::Collector;
use rendertoy_packager::config::ReleaseConfig;
use rendertoy_packager::error::PackagerError;
use rendertoy_packager::pipeline::{Pipeline, ReleaseOutput, RunOptions};
use rendertoy_packager::stage::Stage;
use rendertoy_packager::test_utils::{
    ExpectedCall, FAKE_FILES, StubExecutor, seed_release_sources, snapshot_tree,
};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::fs;
use tempfile::TempDir;

const TOOL: &str = "tools/tundra/bin-win32/tundra2.exe";

// ---------------------------------------------------------------------------
// World types
// ---------------------------------------------------------------------------

#[derive(Default)]
struct ReleaseWorld {
    temp_dir: Option<TempDir>,
    config: ReleaseConfig,
    staged: Vec<Utf8PathBuf>,
    output: Option<ReleaseOutput>,
    error: Option<PackagerError>,
    build_invoked: bool,
}

#[fixture]
fn world() -> ReleaseWorld {
    ReleaseWorld {
        temp_dir: Some(TempDir::new().expect("temp dir")),
        ..ReleaseWorld::default()
    }
}

fn root(world: &ReleaseWorld) -> Utf8PathBuf {
    let path = world.temp_dir.as_ref().expect("temp_dir set").path();
    Utf8PathBuf::try_from(path.to_path_buf()).expect("temp dir is UTF-8")
}

fn stage_dir(world: &ReleaseWorld) -> Utf8PathBuf {
    root(world).join(&world.config.stage.dir)
}

fn zip_files_in(dir: &Utf8Path) -> Vec<String> {
    fs::read_dir(dir)
        .expect("read project root")
        .map(|entry| entry.expect("dir entry").file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".zip"))
        .collect()
}

// ---------------------------------------------------------------------------
// Step definitions
// ---------------------------------------------------------------------------

#[given("a seeded rendertoy project")]
fn given_seeded_project(world: &mut ReleaseWorld) {
    seed_release_sources(&root(world)).expect("seed sources");
}

#[given("a stale file in the staging directory")]
fn given_stale_file(world: &mut ReleaseWorld) {
    let stage = stage_dir(world);
    fs::create_dir_all(stage.join("old")).expect("create stale dir");
    fs::write(stage.join("old/leftover.txt"), b"previous run").expect("write stale file");
}

#[given("the executable is missing")]
fn given_missing_executable(world: &mut ReleaseWorld) {
    fs::remove_file(root(world).join(FAKE_FILES[0])).expect("remove executable");
}

#[given("the release version \"{version}\"")]
fn given_release_version(world: &mut ReleaseWorld, version: String) {
    world.config.archive.version = version;
}

#[given("the staging directory \"{dir}\"")]
fn given_stage_dir(world: &mut ReleaseWorld, dir: String) {
    world.config.stage.dir = Utf8PathBuf::from(dir);
}

#[when("the staging directory is reset twice")]
fn when_stage_reset_twice(world: &mut ReleaseWorld) {
    let stage = Stage::new(stage_dir(world));
    stage.reset().expect("first reset");
    stage.reset().expect("second reset");
}

#[when("the artefacts are collected")]
fn when_artefacts_collected(world: &mut ReleaseWorld) {
    let collector = Collector::new(root(world), stage_dir(world));
    world.staged = collector
        .collect_all(&world.config.artifacts())
        .expect("collection succeeds");
}

#[when("the release runs")]
fn when_release_runs(world: &mut ReleaseWorld) {
    let root = root(world);
    let executor = StubExecutor::new(vec![ExpectedCall::exiting(
        root.join(TOOL).as_str(),
        &["release"],
        0,
    )]);
    let result = Pipeline::new(root, &world.config, &executor)
        .and_then(|pipeline| pipeline.run(RunOptions::default()));
    world.build_invoked = executor.is_finished();
    match result {
        Ok(output) => world.output = Some(output),
        Err(e) => world.error = Some(e),
    }
}

#[then("the staging directory is empty")]
fn then_stage_empty(world: &mut ReleaseWorld) {
    let stage = Stage::new(stage_dir(world));
    assert!(stage.path().is_dir(), "stage must exist");
    assert!(stage.is_empty().expect("stage readable"), "stage must be empty");
}

#[then("the stage holds exactly the four release entries")]
fn then_stage_holds_entries(world: &mut ReleaseWorld) {
    let stage = stage_dir(world);
    let mut names: Vec<String> = fs::read_dir(&stage)
        .expect("read stage")
        .map(|entry| entry.expect("dir entry").file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(
        names,
        ["FreeImage.dll", "data", "rendertoy.exe", "sublimePlugin"]
    );
    assert_eq!(world.staged.len(), 4);

    let source = snapshot_tree(&root(world).join("data")).expect("snapshot source");
    let copied = snapshot_tree(&stage.join("data")).expect("snapshot copy");
    assert_eq!(source, copied, "data tree must be copied verbatim");
}

#[then("the release succeeds")]
fn then_release_succeeds(world: &mut ReleaseWorld) {
    assert!(
        world.error.is_none(),
        "unexpected error: {:?}",
        world.error
    );
    assert!(world.output.is_some(), "output must be set");
}

#[then("the archive extracts to the staged tree")]
fn then_archive_matches_stage(world: &mut ReleaseWorld) {
    let output = world.output.as_ref().expect("output set");
    let extracted = root(world).join("extracted");
    let file = fs::File::open(&output.archive.path).expect("open archive");
    zip::ZipArchive::new(file)
        .expect("read archive")
        .extract(&extracted)
        .expect("extract archive");

    assert_eq!(
        snapshot_tree(&extracted).expect("snapshot extracted"),
        snapshot_tree(&stage_dir(world)).expect("snapshot stage"),
    );
}

#[then("the release fails with a missing source error")]
fn then_missing_source(world: &mut ReleaseWorld) {
    let err = world.error.as_ref().expect("error set");
    assert!(err.is_missing_source(), "expected missing source, got {err}");
}

#[then("the release fails with an invalid name error")]
fn then_invalid_name(world: &mut ReleaseWorld) {
    let err = world.error.as_ref().expect("error set");
    assert!(
        matches!(err, PackagerError::InvalidName { .. }),
        "expected invalid name, got {err}"
    );
}

#[then("the release fails with an unsafe path error")]
fn then_unsafe_path(world: &mut ReleaseWorld) {
    let err = world.error.as_ref().expect("error set");
    assert!(
        matches!(err, PackagerError::UnsafePath { .. }),
        "expected unsafe path, got {err}"
    );
}

#[then("the project sources are intact")]
fn then_sources_intact(world: &mut ReleaseWorld) {
    let root = root(world);
    for file in FAKE_FILES {
        assert!(root.join(file).is_file(), "{file} must survive");
    }
    assert!(root.join("data/scene.json").is_file(), "data must survive");
}

#[then("no archive is written")]
fn then_no_archive(world: &mut ReleaseWorld) {
    assert!(zip_files_in(&root(world)).is_empty(), "no zip may exist");
}

#[then("the archive is named \"{filename}\"")]
fn then_archive_named(world: &mut ReleaseWorld, filename: String) {
    let output = world.output.as_ref().expect("output set");
    assert_eq!(output.archive.path, root(world).join(&filename));
    assert!(output.archive.path.is_file(), "archive must exist");
}

#[then("the build tool was invoked")]
fn then_build_invoked(world: &mut ReleaseWorld) {
    assert!(world.build_invoked, "build tool must run once");
    let output = world.output.as_ref().expect("output set");
    assert_eq!(output.build_succeeded, Some(true));
}

// ---------------------------------------------------------------------------
// Scenario bindings
// ---------------------------------------------------------------------------

#[scenario(
    path = "tests/features/packager.feature",
    name = "Resetting the stage twice leaves it empty"
)]
fn scenario_reset_idempotent(world: ReleaseWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/packager.feature",
    name = "Collection places every artefact at the top of the stage"
)]
fn scenario_collection_complete(world: ReleaseWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/packager.feature",
    name = "The archive reproduces the staged tree"
)]
fn scenario_archive_round_trip(world: ReleaseWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/packager.feature",
    name = "A missing executable aborts the release"
)]
fn scenario_missing_executable(world: ReleaseWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/packager.feature",
    name = "The archive name follows the version label"
)]
fn scenario_archive_name(world: ReleaseWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/packager.feature",
    name = "A version label containing a path separator is rejected"
)]
fn scenario_invalid_version(world: ReleaseWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/packager.feature",
    name = "A full release builds and packages the project"
)]
fn scenario_full_release(world: ReleaseWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/packager.feature",
    name = "A staging directory at the project root is refused"
)]
fn scenario_stage_at_root(world: ReleaseWorld) {
    let _ = world;
}
