use replica_domain::domain_event::{DomainEvent, EventContext, EventEnvelope};
use replica_macros::domain_event;

#[domain_event(kind = "member.joined")]
struct MemberJoined {
    member_id: i64,
    nickname: String,
}

#[domain_event(kind = "member.renamed", version = 2)]
struct MemberRenamed {
    member_id: i64,
    to: String,
}

fn main() {
    assert_eq!(MemberJoined::KIND, "member.joined");
    assert_eq!(MemberJoined::VERSION, 1);
    assert_eq!(MemberRenamed::VERSION, 2);

    let event = MemberJoined {
        member_id: 7,
        nickname: "ann".to_string(),
    };
    let envelope = EventEnvelope::new(&event, EventContext::default()).unwrap();
    assert!(envelope.is::<MemberJoined>());
    assert!(!envelope.is::<MemberRenamed>());
    assert_eq!(envelope.decode::<MemberJoined>().unwrap(), event);

    let _ = MemberRenamed {
        member_id: 7,
        to: "annie".to_string(),
    };
}
