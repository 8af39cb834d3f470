/// A named request fixture, fed to the decoders either whole or in fixed size fragments.
#[derive(Debug, Copy, Clone)]
pub struct TestCase {
    name: &'static str,
    file: TestFile,
    delivery: Delivery,
}

impl TestCase {
    pub fn new(name: &'static str, file: TestFile, delivery: Delivery) -> Self {
        Self { name, file, delivery }
    }

    pub fn whole(name: &'static str, file: TestFile) -> Self {
        Self::new(name, file, Delivery::Whole)
    }

    pub fn fragmented(name: &'static str, file: TestFile, size: usize) -> Self {
        Self::new(name, file, Delivery::Fragments(size))
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn delivery(&self) -> Delivery {
        self.delivery
    }

    pub fn file(&self) -> &TestFile {
        &self.file
    }

    pub fn file_name(&self) -> &'static str {
        self.file().file_name
    }

    /// The fixture split the way a non-blocking socket would hand it over.
    pub fn pieces(&self) -> Vec<&'static [u8]> {
        let content = self.file.content().as_bytes();
        match self.delivery {
            Delivery::Whole => vec![content],
            Delivery::Fragments(size) => content.chunks(size.max(1)).collect(),
        }
    }
}

#[derive(Debug, Copy, Clone)]
pub struct TestFile {
    file_name: &'static str,
    content: &'static str,
}

impl TestFile {
    pub const fn new(file_name: &'static str, content: &'static str) -> Self {
        Self { file_name, content }
    }

    pub fn content(&self) -> &'static str {
        self.content
    }

    pub fn file_name(&self) -> &'static str {
        self.file_name
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delivery {
    Whole,
    Fragments(usize),
}
