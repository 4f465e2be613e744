use super::*;

fn sample_fs() -> MemoryFileSystem {
    let fs = MemoryFileSystem::new();
    fs.insert("textures/hero.png", b"hero".to_vec());
    fs.insert("textures/ui/button.png", b"button".to_vec());
    fs.insert("shaders/sprite.vs", b"void main() {}".to_vec());
    fs.insert("readme.txt", b"hello".to_vec());
    fs
}

#[test]
fn test_normalize_path() {
    assert_eq!(normalize_path("/textures\\hero.png"), "textures/hero.png");
    assert_eq!(normalize_path("//a/./b//c"), "a/b/c");
    assert_eq!(normalize_path("/"), "");
}

#[test]
fn test_find_and_load_file() {
    let fs = sample_fs();
    let file = fs.find_file("/textures/hero.png").unwrap();
    assert_eq!(file.path(), "textures/hero.png");
    assert!(file.can_read());
    assert!(file.can_write());
    assert_eq!(file.load_content().unwrap().data(), b"hero");
    assert!(fs.find_file("textures/missing.png").is_none());
}

#[test]
fn test_directories() {
    let fs = sample_fs();
    let root = fs.root_directory();
    assert_eq!(root.path(), "");
    assert_eq!(root.file_names(), vec!["readme.txt"]);
    assert_eq!(root.directory_names(), vec!["shaders", "textures"]);

    let textures = fs.find_directory("textures").unwrap();
    assert_eq!(textures.file_names(), vec!["hero.png"]);
    assert_eq!(textures.directory_names(), vec!["ui"]);

    let button = textures.find_file("ui\\button.png").unwrap();
    assert_eq!(button.path(), "textures/ui/button.png");
    assert!(fs.find_directory("sounds").is_none());
}

#[test]
fn test_read_only() {
    let fs = MemoryFileSystem::read_only();
    fs.insert("a.bin", vec![1u8, 2, 3]);
    let file = fs.find_file("a.bin").unwrap();
    assert!(file.can_read());
    assert!(!file.can_write());
}

#[test]
fn test_removed_file_cannot_be_read() {
    let fs = sample_fs();
    let file = fs.find_file("readme.txt").unwrap();
    assert!(fs.remove("readme.txt"));
    assert!(!file.can_read());
    assert!(file.load_content().is_none());
    assert_eq!(fs.file_count(), 3);
}

#[test]
fn test_data_buffer_variants() {
    let exclusive = DataBuffer::from(vec![1u8, 2]);
    let shared = DataBuffer::from(Arc::<[u8]>::from(vec![1u8, 2]));
    assert_eq!(exclusive.data(), shared.data());
    assert_eq!(shared.size(), 2);
    assert_eq!(shared.into_vec(), vec![1, 2]);
}
