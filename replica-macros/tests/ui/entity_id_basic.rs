use replica_domain::entity::SequentialIdentity;
use replica_macros::entity_id;

#[entity_id(sequential)]
struct MemberId(i64);

#[entity_id(debug = false)]
struct ProductCode(String);

impl std::fmt::Debug for ProductCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ProductCode(..)")
    }
}

fn main() {
    let id = MemberId::from_sequence(7);
    assert_eq!(id, MemberId::new(7));
    assert_eq!(id.to_string(), "7");
    assert_eq!(MemberId::unassigned(), MemberId::new(0));

    let code = ProductCode::new("sku-1".to_string());
    let _ = format!("{:?}", code); // 手写 Debug，未自动派生
}
