use replica_macros::value_object;

#[value_object]
struct Nickname {
    value: String,
}

#[value_object(default = false, copy = true)]
struct Price(i64);

#[value_object]
enum Grade {
    #[default]
    Bronze,
    Gold,
}

fn main() {
    let a = Nickname::default();
    let _eq = a.clone() == Nickname { value: String::new() };
    let _ = format!("{:?}", a);

    let p = Price(10);
    let q = p; // Copy
    assert_eq!(p, q);

    let _g: Grade = Default::default();
    let _ = Grade::Gold;
}
