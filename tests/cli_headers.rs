use std::fs;
use std::process::Command;

use tempfile::tempdir;

const HEADER_A: &str = "##fileformat=VCFv4.2\n\
##INFO=<ID=DP,Number=1,Type=Integer,Description=\"Depth\">\n\
##FORMAT=<ID=GT,Number=1,Type=String,Description=\"Genotype\">\n\
##FORMAT=<ID=DP,Number=1,Type=Integer,Description=\"Depth\">\n\
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tNA001\tNA002\n\
1\t100\t.\tA\tG\t.\tPASS\tDP=3\tGT\t0/1\t0/0\n";

const HEADER_B: &str = "##fileformat=VCFv4.2\n\
##INFO=<ID=AF,Number=A,Type=Float,Description=\"Frequency\">\n\
##FORMAT=<ID=GT,Number=1,Type=String,Description=\"Genotype\">\n\
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tNA003\tNA001\n";

fn run_cli(args: &[&str]) -> (bool, String) {
    let exe = env!("CARGO_BIN_EXE_merged-lut");
    let output = Command::new(exe)
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("run merged-lut cli");
    (
        output.status.success(),
        String::from_utf8(output.stdout).expect("utf8 stdout"),
    )
}

#[test]
fn samples_are_merged_by_union() {
    let tmp = tempdir().expect("temporary directory");
    let a = tmp.path().join("a.vcf");
    let b = tmp.path().join("b.vcf");
    fs::write(&a, HEADER_A).expect("write a.vcf");
    fs::write(&b, HEADER_B).expect("write b.vcf");

    let (ok, stdout) = run_cli(&["samples", a.to_str().unwrap(), b.to_str().unwrap()]);
    assert!(ok, "CLI failed");
    assert_eq!(
        stdout,
        "merged_index\tname\ta.vcf\tb.vcf\n\
0\tNA001\t0\t1\n\
1\tNA002\t1\t.\n\
2\tNA003\t.\t0\n"
    );
}

#[test]
fn info_and_format_ids_are_merged_once() {
    let tmp = tempdir().expect("temporary directory");
    let a = tmp.path().join("a.vcf");
    let b = tmp.path().join("b.vcf");
    fs::write(&a, HEADER_A).expect("write a.vcf");
    fs::write(&b, HEADER_B).expect("write b.vcf");

    let (ok, stdout) = run_cli(&["fields", a.to_str().unwrap(), b.to_str().unwrap()]);
    assert!(ok, "CLI failed");
    assert_eq!(
        stdout,
        "merged_index\tname\ta.vcf\tb.vcf\n\
0\tDP\t0\t.\n\
1\tGT\t1\t1\n\
2\tAF\t.\t0\n"
    );
}

#[test]
fn header_without_chrom_line_fails() {
    let tmp = tempdir().expect("temporary directory");
    let broken = tmp.path().join("broken.vcf");
    fs::write(&broken, "##fileformat=VCFv4.2\n").expect("write broken.vcf");

    let (ok, stdout) = run_cli(&["samples", broken.to_str().unwrap()]);
    assert!(!ok);
    assert!(stdout.is_empty());
}

#[test]
fn config_file_is_honoured() {
    let tmp = tempdir().expect("temporary directory");
    let a = tmp.path().join("a.vcf");
    let config = tmp.path().join("merge.toml");
    fs::write(&a, HEADER_A).expect("write a.vcf");
    fs::write(&config, "field_capacity = 16\nlog_level = \"error\"\n").expect("write config");

    let (ok, stdout) = run_cli(&["--config", config.to_str().unwrap(), "samples", a.to_str().unwrap()]);
    assert!(ok, "CLI failed");
    assert!(stdout.starts_with("merged_index\tname\ta.vcf\n"));

    fs::write(&config, "allele_capacity = 0\n").expect("write config");
    let (ok, _) = run_cli(&["--config", config.to_str().unwrap(), "samples", a.to_str().unwrap()]);
    assert!(!ok);
}
