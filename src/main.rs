use jsonpath_get::{errors::PathError, get};
use serde_json::Value;

fn main() -> Result<(), PathError> {
    let data = r#"
        {
            "store": {
                "bicycle": {"color": "red", "price": 19.95},
                "book": [
                    {"title": "Sayings of the Century", "price": 8.95},
                    {"title": "Sword of Honour", "price": 12.99},
                    {"title": "Moby Dick", "isbn": "0-553-21311-3", "price": 8.99}
                ]
            }
        }"#;

    let value: Value = serde_json::from_str(data).unwrap();

    let rv = get(&value, "$..book[?(@.price<10)].title")?;
    println!("{:#?}", rv);

    Ok(())
}
