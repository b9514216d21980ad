use pixbench::TrackingAllocator;

#[global_allocator]
static GLOBAL: TrackingAllocator = TrackingAllocator;

fn main() -> anyhow::Result<()> {
    pixbench::run()
}
