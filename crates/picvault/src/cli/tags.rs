//! Tag command handlers.

use super::commands::TagCommands;
use picvault::ImageService;

/// Handle tag management commands.
pub async fn handle_tag_command(
    service: &ImageService,
    cmd: TagCommands,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        TagCommands::List => {
            for tag in service.list_tags().await? {
                println!("{}\t{}\t{}", tag.id, tag.tag_name, tag.created_at);
            }
        }

        TagCommands::Create { name } => {
            let tag = service.create_tag(&name).await?;
            println!("{}", tag.id);
        }

        TagCommands::Rename { id, name } => {
            let tag = service.rename_tag(id, &name).await?;
            println!("Renamed tag {} to '{}'", tag.id, tag.tag_name);
        }

        TagCommands::Delete { id } => {
            service.delete_tag(id).await?;
            println!("Deleted tag {}", id);
        }

        TagCommands::Attach { names, images } => {
            service.add_tags_to_images(&images, &names).await?;
            println!("Tagged {} image(s)", images.len());
        }

        TagCommands::Replace { id, names } => {
            service.replace_image_tags(id, &names).await?;
            println!("Image {} now has {} tag(s)", id, names.len());
        }
    }

    Ok(())
}
