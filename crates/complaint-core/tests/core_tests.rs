use std::fs;
use std::io::Write;
use tempfile::TempDir;

use complaint_core::chunker::{Chunker, ChunkingConfig};
use complaint_core::corpus::{load_corpus, read_corpus};
use complaint_core::Error;

const HEADER: &str = "complaint_id,product,issue,cleaned_narrative\n";

#[test]
fn load_single_csv_file() {
    let tmp = TempDir::new().unwrap();
    let file_path = tmp.path().join("complaints.csv");
    let mut f = fs::File::create(&file_path).unwrap();
    write!(f, "{HEADER}1,BNPL,Billing,Affirm charged me twice for one purchase.\n2,Credit card,Fees,\"Late fee, even though I paid early.\"\n").unwrap();

    let records = load_corpus(&file_path).expect("load");

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id, "1");
    assert_eq!(records[0].category, "BNPL");
    assert_eq!(records[1].text, "Late fee, even though I paid early.");
}

#[test]
fn load_directory_reads_every_csv_in_path_order() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::create_dir_all(dir.join("nested")).unwrap();
    fs::write(dir.join("a.csv"), format!("{HEADER}10,Savings account,Closure,alpha bravo\n")).unwrap();
    fs::write(dir.join("nested/b.csv"), format!("{HEADER}11,Personal loan,Rates,charlie delta\n")).unwrap();
    fs::write(dir.join("notes.txt"), "ignored").unwrap();

    let records = load_corpus(dir).expect("load dir");

    let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["10", "11"]);
}

#[test]
fn missing_required_column_is_a_validation_error() {
    let csv = "complaint_id,product\n1,BNPL\n";
    let err = read_corpus(csv.as_bytes()).expect_err("missing column");
    match err {
        Error::Validation(msg) => assert!(msg.contains("cleaned_narrative"), "{msg}"),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn missing_path_is_a_validation_error() {
    let tmp = TempDir::new().unwrap();
    assert!(matches!(load_corpus(&tmp.path().join("nope.csv")), Err(Error::Validation(_))));
}

#[test]
fn empty_narratives_are_loaded_then_skipped_by_the_chunker() {
    let csv = format!("{HEADER}1,BNPL,Billing,Affirm charged me twice for one purchase.\n2,BNPL,Billing,\n3,Credit card,Fees,   \n");
    let records = read_corpus(csv.as_bytes()).expect("read");
    assert_eq!(records.len(), 3);

    let chunker = Chunker::new(ChunkingConfig::fixed(50, 10)).expect("chunker");
    let corpus = chunker.chunk_records(&records).expect("chunk");

    assert_eq!(corpus.skipped, 2);
    assert_eq!(corpus.chunks.len(), 1);
    assert_eq!(corpus.chunks[0].chunk.doc_id, "1");
    assert!(corpus.chunks.iter().all(|c| !c.chunk.chunk_text.trim().is_empty()));
}
