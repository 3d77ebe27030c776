//! ensure serde is working as expected

use super::*;

#[test]
fn test_serde() {
    #[derive(serde::Serialize, serde::Deserialize, Debug, PartialEq, Eq)]
    struct MyTypes {
        f1: Fixed,
        point: Point<Fixed>,
        bounds: BoundingBox<Fixed>,
    }

    let my_instance = MyTypes {
        f1: Fixed::from_f64(521.5),
        point: Point::from_i32(-12, 700),
        bounds: BoundingBox {
            x_min: Fixed::ZERO,
            y_min: Fixed::from_i32(-15),
            x_max: Fixed::from_i32(500),
            y_max: Fixed::from_f64(715.25),
        },
    };

    let dumped = serde_json::to_string(&my_instance).unwrap();
    let loaded: MyTypes = serde_json::from_str(&dumped).unwrap();
    assert_eq!(my_instance, loaded)
}
