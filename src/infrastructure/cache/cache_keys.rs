pub fn balance_key(group_id: &str) -> String {
    format!("balance:{}", group_id)
}
