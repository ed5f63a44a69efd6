//! Integration tests for the CLI binary.

use assert_cmd::Command;
use predicates::str::contains;
use tempfile::TempDir;

mod common;

use common::{write_float32, write_people};

fn cli() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("pqvtab"))
}

#[test]
fn cli_schema_prints_create_statement() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = TempDir::new()?;
    let parquet = tmp.path().join("people.parquet");
    write_people(&parquet, 0, 10, 4)?;

    cli()
        .args(["schema", parquet.to_string_lossy().as_ref()])
        .assert()
        .success()
        .stdout(contains(
            r#"CREATE TABLE x("id" BIGINT, "name" TEXT, "score" DOUBLE, "flag" TINYINT, "payload" BLOB, "VirtualRowId" INT);"#,
        ))
        .stdout(contains("files: 1, row_groups: 3, rows: 10"));

    Ok(())
}

#[test]
fn cli_scan_prunes_row_groups() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = TempDir::new()?;
    let parquet = tmp.path().join("people.parquet");
    write_people(&parquet, 0, 10, 4)?;

    cli()
        .args([
            "scan",
            parquet.to_string_lossy().as_ref(),
            "--where",
            "id >= 8",
            "--columns",
            "id,name,payload",
            "--format",
            "csv",
            "--stats",
        ])
        .assert()
        .success()
        .stdout(contains("id,name,payload\n8,n8,x'08ff'\n9,,x'09ff'\n"))
        .stdout(contains("total_rows: 2"))
        .stdout(contains("row_groups_pruned: 2"))
        .stdout(contains("rows_pruned: 8"));

    Ok(())
}

#[test]
fn cli_scan_combines_filters_on_text_and_numbers() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = TempDir::new()?;
    let parquet = tmp.path().join("people.parquet");
    write_people(&parquet, 0, 10, 4)?;

    cli()
        .args([
            "scan",
            parquet.to_string_lossy().as_ref(),
            "--where",
            "name >= 'n4'",
            "--where",
            "score < 3.5",
            "--columns",
            "id",
            "--format",
            "csv",
        ])
        .assert()
        .success()
        .stdout("id\n4\n5\n");

    Ok(())
}

#[test]
fn cli_scan_filters_on_row_id_across_module_args() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = TempDir::new()?;
    let a = tmp.path().join("a.parquet");
    let b = tmp.path().join("b.parquet");
    write_people(&a, 0, 5, 5)?;
    write_people(&b, 100, 5, 2)?;
    let module_args = format!("'{}', '{}'", a.display(), b.display());

    cli()
        .args([
            "scan",
            "--module-args",
            module_args.as_str(),
            "--where",
            "VirtualRowId = 6",
            "--columns",
            "VirtualRowId,id",
            "--format",
            "csv",
        ])
        .assert()
        .success()
        .stdout("VirtualRowId,id\n6,101\n");

    Ok(())
}

#[test]
fn cli_scan_accepts_quoted_module_arg_with_comma() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = TempDir::new()?;
    let odd = tmp.path().join("a,b.parquet");
    write_people(&odd, 0, 3, 3)?;
    let module_args = format!("\"{}\"", odd.display());

    cli()
        .args([
            "scan",
            "--module-args",
            module_args.as_str(),
            "--columns",
            "id",
            "--format",
            "csv",
        ])
        .assert()
        .success()
        .stdout("id\n0\n1\n2\n");

    Ok(())
}

#[test]
fn cli_scan_table_output_respects_max_rows() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = TempDir::new()?;
    let parquet = tmp.path().join("people.parquet");
    write_people(&parquet, 0, 10, 4)?;

    cli()
        .args([
            "scan",
            parquet.to_string_lossy().as_ref(),
            "--max-rows",
            "2",
            "--stats",
        ])
        .assert()
        .success()
        .stdout(contains("score"))
        .stdout(contains("NULL"))
        .stdout(contains("showing 2 of 10 rows"))
        .stdout(contains("row_groups_scanned: 3"));

    cli()
        .args([
            "scan",
            parquet.to_string_lossy().as_ref(),
            "--where",
            "id > 100",
        ])
        .assert()
        .success()
        .stdout(contains("(no rows)"));

    Ok(())
}

#[test]
fn cli_reports_bad_input() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = TempDir::new()?;
    let parquet = tmp.path().join("people.parquet");
    let float = tmp.path().join("float.parquet");
    write_people(&parquet, 0, 3, 3)?;
    write_float32(&float)?;

    cli()
        .args(["schema", tmp.path().join("missing.parquet").to_string_lossy().as_ref()])
        .assert()
        .failure()
        .stderr(contains("Failed to open table"));

    cli()
        .args(["schema", float.to_string_lossy().as_ref()])
        .assert()
        .failure()
        .stderr(contains("unsupported type"));

    cli()
        .args(["schema"])
        .assert()
        .failure()
        .stderr(contains("no files given"));

    cli()
        .args([
            "scan",
            parquet.to_string_lossy().as_ref(),
            "--where",
            "nope = 1",
        ])
        .assert()
        .failure()
        .stderr(contains("Unknown column 'nope'"));

    cli()
        .args([
            "scan",
            parquet.to_string_lossy().as_ref(),
            "--where",
            "id = abc",
        ])
        .assert()
        .failure()
        .stderr(contains("column id is BIGINT"));

    Ok(())
}
