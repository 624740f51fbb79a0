use redis::Script;

/// KEYS: lock key, last-run hash.
/// ARGV: holder, ttl in ms, task name, encoded last-run record.
const CLAIM_AND_RECORD: &str = r#"
if redis.call('set', KEYS[1], ARGV[1], 'NX', 'PX', ARGV[2]) then
  redis.call('hset', KEYS[2], ARGV[3], ARGV[4])
  return 1
end
return 0
"#;

pub(crate) fn claim_and_record() -> Script {
    Script::new(CLAIM_AND_RECORD)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_is_set_before_the_record() {
        let set = CLAIM_AND_RECORD.find("'set'").unwrap();
        let hset = CLAIM_AND_RECORD.find("'hset'").unwrap();
        assert!(set < hset);
        assert!(CLAIM_AND_RECORD.contains("'NX', 'PX'"));
    }

    #[test]
    fn script_hash_is_stable() {
        assert_eq!(claim_and_record().get_hash(), claim_and_record().get_hash());
    }
}
