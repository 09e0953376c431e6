//! Drives a small transaction stream through a sliding window, printing the
//! closed itemsets and their supports after every step (spec §6's driver
//! pseudo-loop: `if i >= W { engine.delete(tdb[i-W]) }; engine.add(tdb[i])`).

use fcim::diu::DiuEngine;
use fcim::engine::SlidingWindowAlgorithm;
use fcim::itemset::Itemset;

fn txn(items: &[&'static str]) -> Itemset<&'static str> {
    Itemset::from_iter(items.iter().copied())
}

fn main() {
    tracing_subscriber::fmt::init();

    let transactions: Vec<Itemset<&'static str>> = vec![
        txn(&["c", "e", "a", "b", "f"]),
        txn(&["a", "c", "g"]),
        txn(&["e"]),
        txn(&["a", "c", "e", "g", "d"]),
        txn(&["a", "c", "e", "g"]),
        txn(&["e"]),
        txn(&["a", "c", "e", "b", "f"]),
        txn(&["a", "c", "d"]),
        txn(&["a", "c", "e", "g"]),
        txn(&["a", "c", "e", "g"]),
    ];
    let window_size = 4;
    let minimum_support = 2;

    let mut engine = DiuEngine::<&str>::new();
    for (i, t) in transactions.iter().enumerate() {
        if i >= window_size {
            engine.delete(&transactions[i - window_size]).unwrap();
        }
        engine.add(t.clone()).unwrap();

        let frequent = engine.closed_frequent(minimum_support);
        println!("after transaction {i}: {} closed frequent itemsets", frequent.len());
        for itemset in &frequent {
            println!("  {:?} support={}", itemset, engine.support(itemset));
        }
    }
}
