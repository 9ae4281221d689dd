//! This is the example from `README.md`

#[test]
#[cfg_attr(miri, ignore)]
fn example() {
    use entropy_coder::{
        stream::{DefaultEntropyReader, DefaultEntropyWriter},
        Interval,
    };

    // A toy model for a binary alphabet where `false` has probability 0.9.
    let model = |bit: bool| {
        let no = Interval::from_probability(0.9).unwrap();
        if bit {
            Interval::new(no.last() + 1, u64::MAX - no.last() - 1).unwrap()
        } else {
            no
        }
    };
    let message = [false, false, true, false, false, false, false, true, false, false];

    let mut writer = DefaultEntropyWriter::new();
    for &bit in &message {
        writer.write_interval(&model(bit)).unwrap();
    }
    let compressed = writer.finalize().unwrap().into_inner();
    println!("Encoded into {} words: {:?}", compressed.len(), compressed);

    // Two unlikely symbols cost about 3.3 bits each, the other eight about 0.15 bits each.
    assert_eq!(compressed.len(), 1);

    let mut reader = DefaultEntropyReader::from_compressed(compressed);
    let mut decoded = Vec::new();
    while !reader.eof() {
        let bit = model(true).includes(reader.value());
        reader.next_interval(&model(bit)).unwrap();
        decoded.push(bit);
    }
    assert_eq!(decoded, message);
}
