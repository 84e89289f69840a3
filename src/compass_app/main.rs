use log::*;

const GLOBE: &str = "\u{1F310}";

fn render() -> String {
    format!("Compass\n\n{GLOBE}\nHello, world!")
}

pub fn main() {
    env_logger::init();
    debug!("Rendering compass view");
    println!("{}", render());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_static_compass_screen() {
        let screen = render();
        assert!(screen.starts_with("Compass"));
        assert!(screen.ends_with("Hello, world!"));
        assert!(screen.contains(GLOBE));
    }
}
