/**
Chain-of-thought rationales. A rationale file holds one block of free text per record, blocks
being separated by blank lines. Block `i` belongs to record `i`: there is no other key.
*/
use crate::record::Record;
use std::io::{self, BufRead};

/// Reads the rationale blocks of a file. The lines of a block are trimmed and joined by a single
/// space.
pub fn read_rationales<R: BufRead>(reader: R) -> io::Result<Vec<String>> {
    let mut rationales = Vec::new();
    let mut current: Vec<String> = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            current.push(String::from(trimmed));
        } else if !current.is_empty() {
            rationales.push(current.join(" "));
            current.clear();
        }
    }
    if !current.is_empty() {
        rationales.push(current.join(" "));
    }
    Ok(rationales)
}

/// Attaches rationale `i` to record `i`. Records without a rationale get an empty string, surplus
/// rationales are ignored.
pub fn align_rationales(records: &mut [Record], rationales: &[String]) {
    if rationales.len() != records.len() {
        log::debug!(
            "Aligning {} rationales with {} records",
            rationales.len(),
            records.len()
        );
    }
    for (i, record) in records.iter_mut().enumerate() {
        let cot = rationales.get(i).cloned().unwrap_or_default();
        record.cot = Some(cot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Labels;
    use std::io::Cursor;

    fn records(n: usize) -> Vec<Record> {
        (0..n)
            .map(|i| Record::new(format!("sentence {}", i), Labels::new()))
            .collect()
    }

    #[test]
    fn test_read_rationales() {
        let input = "\n\nFirst line\n  second line  \n\n\n\nOther block\n";
        let actual = read_rationales(Cursor::new(input)).unwrap();
        assert_eq!(actual, vec!["First line second line", "Other block"]);
    }

    #[test]
    fn test_shorter_rationales_give_empty_strings() {
        let mut recs = records(3);
        align_rationales(&mut recs, &[String::from("why")]);
        let cots: Vec<_> = recs.iter().map(|r| r.cot.clone().unwrap()).collect();
        assert_eq!(cots, vec!["why", "", ""]);
    }

    #[test]
    fn test_no_rationale_file() {
        let mut recs = records(2);
        align_rationales(&mut recs, &[]);
        assert!(recs.iter().all(|r| r.cot.as_deref() == Some("")));
    }

    #[test]
    fn test_surplus_rationales_are_ignored() {
        let mut recs = records(1);
        align_rationales(&mut recs, &[String::from("a"), String::from("b")]);
        assert_eq!(recs[0].cot.as_deref(), Some("a"));
    }
}
