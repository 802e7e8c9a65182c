//! Tests for batch assembly over literal line sequences.

use fsevent_client::events::{Change, EventFlag, OutputMode};
use fsevent_client::stream::{classify, BatchParser, LineError, NumberParsing, RawLine};

fn run(parser: &mut BatchParser, lines: &[&str]) -> Vec<Vec<Change>> {
    let mut batches = Vec::new();
    for line in lines {
        if let Ok(Some(batch)) = parser.push_line(line) {
            batches.push(batch);
        }
    }
    batches
}

#[test]
fn empty_batches_are_not_coalesced() {
    let mut parser = BatchParser::new(OutputMode::Plain, NumberParsing::Permissive);
    let batches = run(&mut parser, &["100:1:/a", "200:2:/b", "", "", "300:3:/c", ""]);

    let paths: Vec<Vec<&str>> = batches
        .iter()
        .map(|b| b.iter().map(Change::path).collect())
        .collect();
    assert_eq!(paths, vec![vec!["/a", "/b"], vec![], vec!["/c"]]);
}

#[test]
fn leading_terminator_yields_heartbeat_batch() {
    let mut parser = BatchParser::default();
    let batches = run(&mut parser, &[""]);
    assert_eq!(batches, vec![Vec::<Change>::new()]);
}

#[test]
fn augmented_record_fields() {
    let mut parser = BatchParser::new(OutputMode::Augmented, NumberParsing::Permissive);
    let batches = run(&mut parser, &["256:42:/tmp/x", ""]);

    let record = batches[0][0].record().expect("augmented record");
    assert!(record.flags.is_set(EventFlag::ItemCreated));
    assert_eq!(record.flags.active().count(), 1);
    assert_eq!(record.id, 42);
    assert_eq!(record.path, "/tmp/x");
}

#[test]
fn greedy_path_field() {
    match classify("0:1:/foo:bar") {
        Ok(RawLine::Event { flags, id, path }) => {
            assert_eq!(flags, "0");
            assert_eq!(id, "1");
            assert_eq!(path, "/foo:bar");
        }
        other => panic!("unexpected classification: {other:?}"),
    }
}

#[test]
fn malformed_lines_do_not_disturb_batch() {
    let mut parser = BatchParser::new(OutputMode::Augmented, NumberParsing::Strict);

    assert_eq!(parser.push_line("1:1:/a"), Ok(None));
    assert!(matches!(
        parser.push_line("no separators"),
        Err(LineError::MissingFields(_))
    ));
    assert!(matches!(
        parser.push_line("ff:1:/b"),
        Err(LineError::InvalidFlags(_))
    ));
    assert_eq!(parser.push_line("2:2:/c"), Ok(None));

    let batch = parser.push_line("").unwrap().unwrap();
    let paths: Vec<&str> = batch.iter().map(Change::path).collect();
    assert_eq!(paths, vec!["/a", "/c"]);
}

#[test]
fn large_event_ids_decode() {
    let mut parser = BatchParser::new(OutputMode::Augmented, NumberParsing::Strict);
    let batches = run(&mut parser, &["0:18446744073709551615:/a", ""]);
    assert_eq!(batches[0][0].record().unwrap().id, u64::MAX);
}

#[test]
fn tail_without_terminator_is_dropped() {
    let mut parser = BatchParser::default();
    let batches = run(&mut parser, &["1:1:/a", "", "2:2:/b"]);

    assert_eq!(batches.len(), 1);
    assert_eq!(parser.finish(), 1);
}
